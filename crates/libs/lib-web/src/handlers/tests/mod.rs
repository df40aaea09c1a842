//! # Handler Tests
//!
//! Integration tests that drive the full router (auth, handlers, live
//! subsystem) against an in-memory database.

mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lib_auth::encode_jwt;
use lib_core::model::store::memory_pool;
use lib_core::model::store::models::UserForCreate;
use lib_core::model::store::UserRepository;
use lib_core::{Config, DbPool};
use serde_json::Value;
use shared::dto::UserId;
use tower::ServiceExt;

use crate::bot::service::tests::Arithmetic;
use crate::bot::CompletionProvider;
use crate::server::{create_router, AppState};

/// Create test config
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret-key-must-be-at-least-32-characters-long!".to_string(),
        jwt_expiration_hours: 24,
    }
}

pub struct TestUser {
    pub id: UserId,
    pub token: String,
}

/// Running app with three seeded users.
pub struct TestCtx {
    pub app: Router,
    pub state: AppState,
    pub pool: DbPool,
    pub u1: TestUser,
    pub u2: TestUser,
    pub u3: TestUser,
}

pub async fn setup() -> TestCtx {
    setup_with_provider(Arc::new(Arithmetic)).await
}

pub async fn setup_with_provider(provider: Arc<dyn CompletionProvider>) -> TestCtx {
    let pool = memory_pool().await.expect("Failed to create test database");
    let config = test_config();

    let mut users = Vec::new();
    for (name, email) in [("User One", "u1@example.com"), ("User Two", "u2@example.com"), ("User Three", "u3@example.com")] {
        let user = UserRepository::create(&pool, UserForCreate::new(name, email))
            .await
            .expect("Failed to seed user");
        let token = encode_jwt(user.id, user.full_name.clone(), &config.jwt_secret, 1).expect("Failed to mint token");
        users.push(TestUser { id: user.id, token });
    }
    let u3 = users.pop().unwrap();
    let u2 = users.pop().unwrap();
    let u1 = users.pop().unwrap();

    let state = AppState::new(pool.clone(), config, provider, Duration::from_secs(2));
    let app = create_router(state.clone(), vec![]);

    TestCtx {
        app,
        state,
        pool,
        u1,
        u2,
        u3,
    }
}

/// Send one request through the router and decode the JSON body (`Null` if empty).
pub async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = setup().await;

    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_api_routes_require_token() {
    let ctx = setup().await;

    for (method, uri) in [
        ("GET", "/api/users"),
        ("GET", "/api/bot/messages"),
        ("GET", "/api/ws/live"),
        ("GET", "/api/conversations/1/messages"),
    ] {
        let (status, body) = call(&ctx.app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["code"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let ctx = setup().await;

    let (status, _) = call(&ctx.app, "GET", "/api/nope", Some(&ctx.u1.token), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
