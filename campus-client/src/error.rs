//! Errors returned by the Campus client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Non-success status other than 404
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Body did not decode into the expected record
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The API answered 404 for this path
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Query key names no known API resource
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// True when the named course, lesson or board does not exist
    ///
    /// Unlike transport or 5xx errors this does not go away on retry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
