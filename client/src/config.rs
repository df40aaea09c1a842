//! # Client Configuration
//!
//! Where the backend lives and which bearer token to present. Loaded from the
//! environment (`.env` is honoured by the binary).
//!
//! | Variable | Default |
//! |---|---|
//! | `API_BASE_URL` | `http://127.0.0.1:3001` |
//! | `CHAT_TOKEN` | required |
//! | `CHAT_REQUEST_TIMEOUT_SECS` | `10` |

use std::time::Duration;

use crate::error::ClientError;

/// Base URL for backend API server
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3001";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub token: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let token = std::env::var("CHAT_TOKEN")
            .map_err(|_| ClientError::Validation("CHAT_TOKEN must be set in environment".to_string()))?;

        let mut config = Self::new(base_url, token);
        if let Ok(raw) = std::env::var("CHAT_REQUEST_TIMEOUT_SECS") {
            let secs = raw
                .parse::<u64>()
                .map_err(|e| ClientError::Validation(format!("CHAT_REQUEST_TIMEOUT_SECS must be a number: {}", e)))?;
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// REST endpoint for `path` (which starts with `/`).
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// WebSocket URL of the live channel, token passed as a query parameter.
    pub fn live_url(&self) -> String {
        let ws_base = if let Some(rest) = self.api_base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.api_base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.api_base_url.clone()
        };
        format!("{}/api/ws/live?token={}", ws_base, self.token)
    }
}
