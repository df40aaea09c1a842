//! # HTTP Request Handlers
//!
//! Axum handlers organized by feature. Every handler here sits behind
//! [`crate::middleware::require_auth`] and reads the caller from
//! `Extension<Claims>`.
//!
//! ## Handler Modules
//!
//! - **[`messages`]**: Direct messages between two users
//!   - `POST /api/conversations/{user_id}/messages` - Send
//!   - `GET /api/conversations/{user_id}/messages` - History
//!
//! - **[`bot`]**: Bot conversation
//!   - `POST /api/bot/ask` - Ask and get the answer
//!   - `GET /api/bot/messages` - Past exchanges
//!
//! - **[`users`]**: User directory
//!   - `GET /api/users` - Other users with online flag
//!
//! - **[`live`]**: Live channel
//!   - `GET /api/ws/live` - WebSocket (`?token=` accepted)
//!
//! ## Error Handling
//!
//! Handlers return `Result<T, AppError>`. `AppError` renders as
//! `{"error", "code", "retryable"}` with the matching status code.

pub mod bot;
pub mod live;
pub mod messages;
pub mod users;

#[cfg(test)]
mod tests;
