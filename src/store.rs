//! Redis-backed conversation state

use crate::runtime::SessionStore;
use crate::state_machine::{ConvState, ConversationId};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored state {label:?} under {key} is not a known state")]
    CorruptState { key: String, label: String },
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Key holding the state label of one conversation
pub fn state_key(id: ConversationId) -> String {
    format!("storefront:state:{id}")
}

/// Parse a stored label, refusing to guess on unknown ones
pub fn decode_label(key: &str, label: &str) -> Result<ConvState, StoreError> {
    label.parse().map_err(|_| StoreError::CorruptState {
        key: key.to_string(),
        label: label.to_string(),
    })
}

/// One string key per conversation, last write wins
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_secs: Option<u64>,
}

impl RedisSessionStore {
    /// Connect to `url`; the manager reconnects on its own after failures
    pub async fn connect(url: &str, ttl_secs: Option<u64>) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(ttl_secs = ?ttl_secs, "connected to session store");
        Ok(Self { conn, ttl_secs })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, id: ConversationId) -> Result<Option<ConvState>, StoreError> {
        let key = state_key(id);
        let mut conn = self.conn.clone();
        let label: Option<String> = conn.get(&key).await?;
        label.map(|label| decode_label(&key, &label)).transpose()
    }

    async fn set(&self, id: ConversationId, state: ConvState) -> Result<(), StoreError> {
        let key = state_key(id);
        let mut conn = self.conn.clone();
        match self.ttl_secs {
            Some(ttl) => conn.set_ex::<_, _, ()>(&key, state.label(), ttl).await?,
            None => conn.set::<_, _, ()>(&key, state.label()).await?,
        }
        tracing::debug!(conv_id = %id, state = %state, "state persisted");
        Ok(())
    }
}
