//! # Web Library
//!
//! HTTP handlers, middleware, the live subsystem and the bot conversation
//! service of the chat backend.

pub mod bot;
pub mod extract;
pub mod handlers;
pub mod live;
pub mod middleware;
pub mod server;

pub use server::{create_router, init_tracing, start_server, AppState, ServerConfig};
