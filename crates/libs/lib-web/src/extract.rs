//! # Request Extractors
//!
//! [`AppJson`] is `axum::Json` with its rejection turned into
//! [`AppError::Validation`], so a malformed body gets the same
//! `{"error", "code", "retryable"}` response as every other failure.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use lib_core::AppError;
use tracing::debug;

/// JSON body extractor for handlers returning `AppError`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "[HTTP] BODY_REJECTED {}", rejection.body_text());
                Err(AppError::Validation(format!("Invalid request body: {}", rejection.body_text())))
            }
        }
    }
}
