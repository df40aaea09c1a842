//! # Services
//!
//! Network-facing pieces of the client.
//!
//! - [`api`]: REST client behind the [`ChatApi`] seam
//! - [`live`]: live channel WebSocket with reconnect

pub mod api;
pub mod live;

pub use api::{ApiClient, ChatApi};
pub use live::run_live_channel;
