//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across the backend. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx) - caller issues, surfaced synchronously
//!    - [`Validation`](AppError::Validation) → 400 Bad Request (rejected before persistence)
//!    - [`Unauthorized`](AppError::Unauthorized) → 401 Unauthorized
//!    - [`NotFound`](AppError::NotFound) → 404 Not Found (unknown recipient)
//!
//! 2. **Upstream Errors** - bot completion provider, retryable by the user
//!    - [`Upstream`](AppError::Upstream) → 502 Bad Gateway
//!    - [`UpstreamTimeout`](AppError::UpstreamTimeout) → 504 Gateway Timeout
//!
//! 3. **Server Errors** (5xx)
//!    - [`Persistence`](AppError::Persistence) → 500 (message was not created)
//!    - [`Config`](AppError::Config) / [`Internal`](AppError::Internal) → 500
//!
//! Push-delivery failures are not represented here: they are logged and dropped
//! at the connection and never reach a caller.
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn check_prompt(prompt: &str) -> Result<()> {
//!     if prompt.trim().is_empty() {
//!         return Err(AppError::Validation("prompt cannot be empty".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use shared::dto::error::ErrorResponse;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request, e.g. a message with neither text nor image.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid bearer token.
    ///
    /// **HTTP Status**: 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Requested user or resource does not exist.
    ///
    /// **HTTP Status**: 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Completion provider failed.
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Completion provider did not answer within the caller's timeout.
    ///
    /// **HTTP Status**: 504 Gateway Timeout
    #[error("Upstream timed out after {}ms", .0.as_millis())]
    UpstreamTimeout(Duration),

    /// Durable store rejected or failed a read/write.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal server error (unexpected failures).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Config(_) | AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Upstream(_) | AppError::UpstreamTimeout(_))
    }

    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::Validation(_) => "Validation",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::NotFound(_) => "NotFound",
            AppError::Upstream(_) => "Upstream",
            AppError::UpstreamTimeout(_) => "UpstreamTimeout",
            AppError::Persistence(_) => "Persistence",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get a user-friendly error message.
    ///
    /// For server-side errors, returns a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Unauthorized(msg) => msg.clone(),
            AppError::Upstream(_) => "The bot is unavailable right now, please try again".to_string(),
            AppError::UpstreamTimeout(_) => "The bot took too long to answer, please try again".to_string(),
            AppError::Persistence(_) => "The message could not be saved".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Full error text stays in server logs
        if status.is_server_error() {
            tracing::error!(code = self.code(), "Server error: {}", self);
        } else {
            tracing::debug!(code = self.code(), "Client error: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.user_message(),
            code: self.code().to_string(),
            retryable: self.is_retryable(),
        });

        (status, body).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Persistence(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Persistence(format!("Database error: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Upstream("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::UpstreamTimeout(Duration::from_secs(3)).status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::Persistence("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_only_upstream_failures_are_retryable() {
        assert!(AppError::Upstream("down".into()).is_retryable());
        assert!(AppError::UpstreamTimeout(Duration::from_secs(30)).is_retryable());
        assert!(!AppError::Validation("bad".into()).is_retryable());
        assert!(!AppError::Persistence("disk".into()).is_retryable());
    }

    #[test]
    fn test_sub_second_timeout_keeps_its_unit() {
        let err = AppError::UpstreamTimeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Upstream timed out after 250ms");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_persistence_message_hides_details() {
        let err = AppError::Persistence("disk I/O error at page 42".into());
        assert_eq!(err.user_message(), "The message could not be saved");
    }
}
