//! # Live Channel Events
//!
//! Events the server pushes over the `/api/ws/live` WebSocket. There are no
//! client→server events; sends go through the REST endpoints.
//!
//! ```json
//! { "type": "presence.update", "data": { "online_user_ids": [1, 2] } }
//! { "type": "message.new", "data": { "id": 5, "sender_id": 2, "recipient_id": 1, "text": "hi", "created_at": "..." } }
//! ```

use serde::{Deserialize, Serialize};

use super::messaging::{Message, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum LiveEvent {
    /// Full snapshot of the online set, never a delta.
    #[serde(rename = "presence.update")]
    PresenceUpdate { online_user_ids: Vec<UserId> },
    /// A message persisted for the receiving user.
    #[serde(rename = "message.new")]
    MessageNew(Message),
}

impl LiveEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LiveEvent::PresenceUpdate { .. } => "presence.update",
            LiveEvent::MessageNew(_) => "message.new",
        }
    }
}
