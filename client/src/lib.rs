//! # Chat Client Library
//!
//! Client side of the two-party chat: REST calls, the live channel, and the
//! conversation view that merges the two.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    ChatSession                       │
//! │   select / send / ask_bot        process_next        │
//! │          │                            ▲              │
//! │          ▼                            │ inbox        │
//! │   ConversationView ◀── apply ─────────┤              │
//! └──────────┬────────────────────────────┼──────────────┘
//!            │ Command                    │ ViewEvent
//!            ▼                            │
//!      ApiClient (reqwest)        run_live_channel (tokio-tungstenite)
//!            │ HTTP                       │ WebSocket
//!            ▼                            ▼
//!        /api/conversations, /api/bot, /api/users, /api/ws/live
//! ```
//!
//! ## Module Structure
//!
//! - [`app`]: view state machine, inbox events, session driver
//! - [`services`]: REST client and live channel
//! - [`config`]: backend location and token
//! - [`error`]: [`ClientError`]

pub mod app;
pub mod config;
pub mod error;
pub mod services;

pub use app::{ChatSession, Conversation, ConversationView, LiveStatus, ViewEvent, ViewState};
pub use config::ClientConfig;
pub use error::ClientError;
pub use services::{ApiClient, ChatApi};
