//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] loads configuration, opens the database, applies
//! migrations, builds the shared [`AppState`] and serves [`create_router`].
//! The connection registry lives in that state: it is created here and dropped
//! with the server.

// region: --- Imports
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use axum::{
    routing::{get, post},
    Router,
};
use lib_core::{create_pool, run_migrations, Config, DbPool};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::bot::{provider_from_config, BotConfig, BotConversationService, CompletionProvider};
use crate::handlers;
use crate::live::{ConnectionRegistry, MessageRouter};
use crate::middleware::{log_requests, require_auth, stamp_req};
use crate::middleware::mw_req_stamp::request_id;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub registry: Arc<ConnectionRegistry>,
    pub router: MessageRouter,
    pub bot: BotConversationService,
}

impl AppState {
    pub fn new(
        db: DbPool,
        config: Config,
        bot_provider: Arc<dyn CompletionProvider>,
        bot_timeout: Duration,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = MessageRouter::new(Arc::clone(&registry));
        let bot = BotConversationService::new(db.clone(), bot_provider, bot_timeout);

        Self {
            db,
            config,
            registry,
            router,
            bot,
        }
    }
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.registry.clone()
    }
}

impl axum::extract::FromRef<AppState> for MessageRouter {
    fn from_ref(state: &AppState) -> Self {
        state.router.clone()
    }
}

impl axum::extract::FromRef<AppState> for BotConversationService {
    fn from_ref(state: &AppState) -> Self {
        state.bot.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `BIND_ADDRESS` and comma-separated `ALLOWED_ORIGINS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind_address = lib_utils::get_env_or("BIND_ADDRESS", &defaults.bind_address);
        let allowed_origins = lib_utils::get_env("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.allowed_origins);

        Self {
            bind_address,
            allowed_origins,
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Install the global tracing subscriber, filtered by `LOG_LEVEL` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = tracing_subscriber::EnvFilter::try_new(&log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .try_init();
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading fails
/// - Database connection or migrations fail
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!(" CHAT BACKEND STARTING");

    info!("Loading configuration...");
    let app_config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    app_config.validate().map_err(|e| anyhow::anyhow!(e))?;

    info!("Database URL: {}", app_config.database_url);

    // Ensure data directory exists for SQLite database
    if let Some(db_path) = app_config.sqlite_path() {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created database directory: {:?}", parent);
            }
        }
    }

    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!(" Running database migrations");
    run_migrations(&pool).await?;
    info!(" Migrations complete");

    let bot_config = BotConfig::from_env().map_err(|e| anyhow::anyhow!("Invalid bot configuration: {}", e))?;
    let provider = provider_from_config(&bot_config);
    info!(
        " Bot provider: {:?} model={} backend={} timeout={}s",
        bot_config.provider,
        bot_config.model,
        provider.name(),
        bot_config.timeout.as_secs()
    );

    let state = AppState::new(pool, app_config, provider, bot_config.timeout);
    let app = create_router(state, config.allowed_origins.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the main application router with all routes
pub fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    info!("[ROUTE SETUP] Registering HTTP routes...");
    let protected = Router::new()
        .route(
            "/api/conversations/{user_id}/messages",
            get(handlers::messages::list_messages).post(handlers::messages::send_message),
        )
        .route("/api/bot/ask", post(handlers::bot::ask_bot))
        .route("/api/bot/messages", get(handlers::bot::bot_history))
        .route("/api/users", get(handlers::users::list_users))
        .route("/api/ws/live", get(handlers::live::live_websocket))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(protected)
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        // Layers run outside-in from the bottom: cors, stamp, trace, logging.
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id(request),
                        method = %request.method(),
                        uri = %request.uri().path(),
                    )
                })
                .on_response(|_response: &Response<_>, _latency: Duration, _span: &tracing::Span| {
                    // Detailed logging is handled by log_requests middleware
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass, latency: Duration, _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!(" MESSAGES:");
    info!("   • POST /api/conversations/{{user_id}}/messages");
    info!("   • GET  /api/conversations/{{user_id}}/messages");
    info!(" BOT:");
    info!("   • POST /api/bot/ask");
    info!("   • GET  /api/bot/messages");
    info!(" USERS:");
    info!("   • GET  /api/users");
    info!(" LIVE:");
    info!("   • GET  /api/ws/live?token={{jwt}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
