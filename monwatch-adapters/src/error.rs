//! Error types for the monitoring API client.

use thiserror::Error;

/// Errors that can occur when talking to the monitoring API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The client could not be configured.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True when the request never produced a usable response.
    ///
    /// Transport failures are reported as gateway request errors; everything
    /// else means the API answered, but not with something we could use.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Http(_) | ApiError::Timeout | ApiError::Connection(_) | ApiError::Config(_)
        )
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}
