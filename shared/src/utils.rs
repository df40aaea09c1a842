//! # Shared Utility Functions
//!
//! Common helpers used by both the backend and the chat client.
//!
//! ```rust
//! use shared::utils::compute_conversation_id;
//!
//! assert_eq!(compute_conversation_id(9, 4), "4:9");
//! assert_eq!(compute_conversation_id(4, 9), "4:9");
//! ```

use crate::dto::messaging::{ParticipantPair, UserId};

/// Stable textual id for the conversation between two users, lower id first.
///
/// Used as the `conversation` log field; conversations are never stored as entities.
pub fn compute_conversation_id(user1_id: UserId, user2_id: UserId) -> String {
    let pair = ParticipantPair::new(user1_id, user2_id);
    format!("{}:{}", pair.low(), pair.high())
}
