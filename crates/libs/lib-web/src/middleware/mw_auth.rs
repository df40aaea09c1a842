//! # Authentication Middleware
//!
//! Verifies the bearer token issued by the account service and injects the
//! caller's [`Claims`] into request extensions.
//!
//! The token is read from `Authorization: Bearer <token>`. Browsers cannot set
//! headers on a WebSocket upgrade, so a `token` query parameter is accepted as
//! well.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/api/users", get(handlers::users::list_users))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```
//!
//! Handlers then extract `Extension<Claims>`.

use axum::{
    extract::{Query, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use lib_auth::{decode_jwt, Claims};
use lib_core::{AppError, Config};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authentication middleware that validates JWT tokens.
///
/// - **Valid token**: continues with `Claims` in extensions
/// - **Missing/invalid token**: `401 Unauthorized` with an error body
pub async fn require_auth(
    State(config): State<Config>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or_else(|| {
        warn!("[AUTH] Missing bearer token path={}", req.uri().path());
        AppError::Unauthorized("Missing bearer token".to_string())
    })?;

    let claims = decode_jwt(&token, &config.jwt_secret).map_err(|e| {
        warn!("[AUTH] JWT validation failed: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    // Reject tokens whose subject is not a user id before any handler runs.
    claims
        .user_id()
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    debug!("[AUTH] Authenticated user: {} (id: {})", claims.name, claims.sub);

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// The caller's user id from verified claims.
pub fn current_user_id(claims: &Claims) -> Result<i64, AppError> {
    claims
        .user_id()
        .map_err(|e| AppError::Unauthorized(e.to_string()))
}

fn bearer_token(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    from_header
        .or_else(|| {
            Query::<TokenQuery>::try_from_uri(req.uri())
                .ok()
                .and_then(|Query(q)| q.token)
        })
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::{Extension, Router};
    use lib_auth::encode_jwt;
    use tower::ServiceExt;

    fn config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-must-be-at-least-32-characters-long!".to_string(),
            jwt_expiration_hours: 24,
        }
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|Extension(claims): Extension<Claims>| async move { claims.sub }),
            )
            .route_layer(axum::middleware::from_fn_with_state(config(), require_auth))
    }

    async fn call(uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_bearer_header_is_accepted() {
        let token = encode_jwt(7, "Ada".to_string(), &config().jwt_secret, 1).unwrap();

        let (status, body) = call("/whoami", Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "7");
    }

    #[tokio::test]
    async fn test_query_token_is_accepted() {
        let token = encode_jwt(9, "Bob".to_string(), &config().jwt_secret, 1).unwrap();

        let (status, body) = call(&format!("/whoami?token={}", token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "9");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (status, body) = call("/whoami", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"code\":\"Unauthorized\""));
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_unauthorized() {
        let token = encode_jwt(7, "Eve".to_string(), "another-secret-that-is-also-32-chars-long", 1).unwrap();

        let (status, _) = call("/whoami", Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
