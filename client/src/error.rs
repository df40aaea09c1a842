//! # Client Error Types
//!
//! One error type for everything the chat client can fail at. It is `Clone`
//! so that results can travel through the session inbox as plain values.
//!
//! ## Error Categories
//!
//! - **Network**: the request never produced an HTTP response (refused, timed out)
//! - **Api**: the backend answered with an error body
//! - **Decode**: a success response could not be parsed
//! - **Live**: the live channel failed
//! - **Validation**: rejected locally before anything was sent

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    /// Error body returned by the backend.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        retryable: bool,
    },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Live channel error: {0}")]
    Live(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ClientError {
    /// Whether trying the same call again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Live(_) => true,
            ClientError::Api { retryable, .. } => *retryable,
            ClientError::Decode(_) | ClientError::Validation(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Live(err.to_string())
    }
}
