//! Error types shared by the adapters and the controller

use crate::presentation::InvalidCallback;
use crate::state_machine::ConversationId;
use crate::store::StoreError;
use thiserror::Error;

/// A failed call to the commerce backend or the messaging transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", origin(.status.as_ref()))]
pub struct BackendError {
    /// HTTP status, absent when no response arrived (timeout, connect failure)
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Failure without an HTTP status
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {error}")
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            format!("request failed: {error}")
        };
        Self {
            status: error.status().map(|s| s.as_u16()),
            message,
        }
    }
}

fn origin(status: Option<&u16>) -> String {
    status.map_or_else(
        || "backend unreachable".to_string(),
        |status| format!("backend returned HTTP {status}"),
    )
}

/// Errors that abort handling of a single inbound event
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no state stored for conversation {conversation_id}, a /start is required")]
    StateLookup { conversation_id: ConversationId },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    InvalidCallback(#[from] InvalidCallback),
}
