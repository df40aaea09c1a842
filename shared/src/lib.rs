//! # Shared Data Transfer Objects Library
//!
//! This library defines the contract between the chat client and the backend API.
//! All DTOs use JSON serialization via `serde` for API and live-channel communication.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects for API communication
//!   - **[`dto::messaging`]**: Direct messages, participant pairs and user profiles
//!   - **[`dto::bot`]**: Bot prompt/response exchanges
//!   - **[`dto::live`]**: Server→client events pushed over the live channel
//!   - **[`dto::error`]**: Error body returned by every failing endpoint
//! - **[`utils`]**: Shared utility functions
//!   - **[`utils::compute_conversation_id`]**: Stable textual id for a participant pair
//!
//! ## Wire Format
//!
//! - Field names use **snake_case** in both Rust and JSON
//! - Optional fields are omitted from JSON when `None`
//! - Timestamps are RFC 3339 strings in UTC
//! - Live events are `{"type": "...", "data": {...}}` envelopes
//!
//! ## Usage in Backend
//!
//! ```rust,ignore
//! use shared::dto::messaging::{Message, SendMessageRequest};
//! use axum::Json;
//!
//! async fn send(Json(request): Json<SendMessageRequest>) -> Json<Message> {
//!     // Request is automatically deserialized from JSON
//!     # todo!()
//! }
//! ```

pub mod dto;
pub mod utils;

// Re-export commonly used types for convenience
pub use dto::*;
pub use utils::*;
