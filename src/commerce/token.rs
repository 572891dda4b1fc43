//! Cached access token for the commerce backend

use crate::error::BackendError;
use chrono::Utc;
use std::future::Future;
use tokio::sync::Mutex;

/// A bearer token and the unix timestamp at which it stops working
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: i64,
}

impl AccessToken {
    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// Lazily filled token slot shared by every conversation
///
/// The lock is held across a refresh so that concurrent callers wait for one
/// refresh instead of racing their own.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, or run `refresh` and cache its result
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, BackendError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, BackendError>>,
    {
        let mut slot = self.slot.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = slot.as_ref().filter(|t| t.is_valid_at(now)) {
            return Ok(token.value.clone());
        }

        let token = refresh().await?;
        tracing::debug!(expires_at = token.expires_at, "commerce access token refreshed");
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }
}
