//! # Connection Handle
//!
//! The server-side end of one live WebSocket connection.
//!
//! A handle never touches the socket. It owns the sending half of a bounded
//! queue of [`OUTBOUND_CAPACITY`] items; the connection's writer task drains the
//! other half. Pushing never waits on the network: once a stalled client has
//! let its queue fill up, further events for it fail with
//! [`TransportError::Full`] and are dropped.

use shared::dto::{LiveEvent, UserId};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use uuid::Uuid;

/// Events a connection may have queued before pushes to it start failing.
pub const OUTBOUND_CAPACITY: usize = 100;

/// Receiving half drained by a connection's writer task.
pub type OutboundReceiver = mpsc::Receiver<Outbound>;

/// Identifies one connection, distinct across reconnects of the same user.
pub type ConnectionId = Uuid;

/// Items consumed by a connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Serialize and send to the client.
    Event(LiveEvent),
    /// Send a close frame and stop writing.
    Close,
}

/// Push to a single connection failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection {connection_id} for user {user_id} is closed")]
    Closed {
        user_id: UserId,
        connection_id: ConnectionId,
    },
    #[error("outbound queue of connection {connection_id} for user {user_id} is full")]
    Full {
        user_id: UserId,
        connection_id: ConnectionId,
    },
}

/// Cheaply cloneable handle to one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: UserId,
    tx: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    /// Create a handle for `user_id` and the receiver its writer task drains.
    pub fn new(user_id: UserId) -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let handle = Self {
            id: Uuid::new_v4(),
            user_id,
            tx,
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Queue an event for the client.
    pub fn push(&self, event: LiveEvent) -> Result<(), TransportError> {
        self.tx.try_send(Outbound::Event(event)).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Full {
                user_id: self.user_id,
                connection_id: self.id,
            },
            TrySendError::Closed(_) => self.closed(),
        })
    }

    /// Ask the writer task to close the socket. Idempotent.
    pub fn close(&self) {
        // A writer that already exited has nothing left to close.
        if let Err(TrySendError::Full(_)) = self.tx.try_send(Outbound::Close) {
            // The writer stops on its own once every handle is dropped.
            warn!(
                user_id = self.user_id,
                connection_id = %self.id,
                "[LIVE] CLOSE_DEFERRED user_id={} queue full",
                self.user_id
            );
        }
    }

    /// True once the writer task has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn closed(&self) -> TransportError {
        TransportError::Closed {
            user_id: self.user_id,
            connection_id: self.id,
        }
    }
}
