//! Error types for notehub-core

use thiserror::Error;

use crate::util::compact_text;

/// Result type alias using notehub-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notehub-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Credential or user identity is missing, expired, or was rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport failure, timeout, or no response
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the note service
    #[error("Server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    /// Request rejected locally before reaching the backend
    #[error("Validation error: {0}")]
    Validation(String),

    /// Response body did not match the expected schema
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),

    /// Client configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Note or attachment not present in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Builds a server error from an HTTP status and raw response body.
    ///
    /// 401 and 403 mean the credential was rejected and map to [`Error::Auth`].
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = compact_text(body);
        match status {
            401 | 403 => {
                let detail = if detail.is_empty() {
                    format!("credential rejected (HTTP {status})")
                } else {
                    format!("{detail} (HTTP {status})")
                };
                Self::Auth(detail)
            }
            _ => Self::Server {
                status,
                body: if detail.is_empty() {
                    format!("Request failed with {status}")
                } else {
                    detail
                },
            },
        }
    }

    /// Whether re-submitting the same request may succeed.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Network(format!("request timed out: {error}"))
        } else if error.is_decode() {
            Self::InvalidPayload(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), "")
        } else {
            Self::Network(error.to_string())
        }
    }
}
