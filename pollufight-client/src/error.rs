//! Error types for the Pollufight client SDK

use thiserror::Error;

/// Client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required configuration is missing or inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Camera device missing or permission refused
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request did not settle within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Server returned an error
    #[error("server error {status}: {message}")]
    Remote { status: u16, message: String },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller-supplied data failed a local precondition
    #[error("validation error: {0}")]
    Validation(String),

    /// Local I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Map a reqwest error, surfacing timeouts as their own kind.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else {
            ClientError::Http(err)
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
