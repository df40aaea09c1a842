//! # Message Router
//!
//! Pushes a freshly persisted message to its recipient's live connection.
//! Push is advisory: the message is already stored, so an offline recipient or
//! a dead socket only means the recipient reads it from history later.

use std::sync::Arc;

use shared::dto::{LiveEvent, Message};
use tracing::{debug, warn};

use super::registry::ConnectionRegistry;

/// What happened to a push. Never an error for the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued on the recipient's connection.
    Delivered,
    /// Recipient has no live connection.
    RecipientOffline,
    /// Recipient was registered but its connection had gone away or its queue was full.
    Dropped,
}

#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Push `message` to its recipient, if connected. Call once per persisted
    /// message. The sender is never pushed its own message.
    pub fn deliver(&self, message: &Message) -> Delivery {
        let Some(handle) = self.registry.lookup(message.recipient_id) else {
            debug!(
                message_id = message.id,
                recipient_id = message.recipient_id,
                "[LIVE] RECIPIENT_OFFLINE message_id={}",
                message.id
            );
            return Delivery::RecipientOffline;
        };

        match handle.push(LiveEvent::MessageNew(message.clone())) {
            Ok(()) => {
                debug!(
                    message_id = message.id,
                    recipient_id = message.recipient_id,
                    "[LIVE] MESSAGE_PUSHED message_id={}",
                    message.id
                );
                Delivery::Delivered
            }
            Err(e) => {
                warn!(
                    message_id = message.id,
                    recipient_id = message.recipient_id,
                    error = %e,
                    "[LIVE] MESSAGE_DROPPED message_id={} error={}",
                    message.id,
                    e
                );
                Delivery::Dropped
            }
        }
    }
}
