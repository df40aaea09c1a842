//! # Core Library
//!
//! Core models, persistence, configuration, and error types for the chat backend.

pub mod config;
pub mod error;
pub mod model;

/// Wire types shared with the client.
pub use shared::dto;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use model::store::{DbPool, create_pool, run_migrations};
