//! # Data Transfer Objects (DTOs)
//!
//! This module contains all data structures exchanged between the chat client
//! and the backend, over REST and over the live WebSocket channel.
//!
//! ## Module Organization
//!
//! - [`messaging`] - Messages, participant pairs, user profiles
//! - [`bot`] - Bot conversation requests, responses and stored exchanges
//! - [`live`] - Live channel events (`presence.update`, `message.new`)
//! - [`error`] - Error response body
//!
//! ## Example JSON Communication
//!
//! ```text
//! POST /api/conversations/2/messages
//! Content-Type: application/json
//!
//! { "text": "hi" }
//! ```
//!
//! ```text
//! HTTP/1.1 201 Created
//! Content-Type: application/json
//!
//! {
//!   "id": 17,
//!   "sender_id": 1,
//!   "recipient_id": 2,
//!   "text": "hi",
//!   "created_at": "2024-01-01T00:00:00Z"
//! }
//! ```

pub mod bot;
pub mod error;
pub mod live;
pub mod messaging;

pub use bot::*;
pub use error::*;
pub use live::*;
pub use messaging::*;
