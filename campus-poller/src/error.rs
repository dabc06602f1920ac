//! Error types for the poller

use campus_core::{PollConfigError, QueryKey};
use thiserror::Error;

/// Reasons a polling activation cannot be started
#[derive(Debug, Error)]
pub enum PollError {
    /// `start` was called with `enabled == false`
    #[error("polling is disabled for key '{0}'")]
    Disabled(QueryKey),

    #[error("invalid poll configuration: {0}")]
    InvalidConfig(#[from] PollConfigError),

    /// Timers need a Tokio runtime to run on
    #[error("no Tokio runtime available to schedule polling")]
    NoRuntime,
}

/// A failed invalidation attempt
///
/// Deliberately a single kind: the controller never distinguishes transport,
/// server or cache errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalidation failed: {message}")]
pub struct InvalidationFailure {
    message: String,
}

impl InvalidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for InvalidationFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{:#}", err))
    }
}
