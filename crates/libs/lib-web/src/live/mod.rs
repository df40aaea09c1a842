//! # Live Subsystem
//!
//! Real-time delivery and presence for connected clients.
//!
//! ## Modules
//!
//! - **[`connection`]**: Per-connection outbound queue handle
//! - **[`registry`]**: User id → connection map, source of the online set
//! - **[`presence`]**: Online-set broadcast to every connection
//! - **[`router`]**: Push of persisted messages to their recipient

// region: --- Modules
pub mod connection;
pub mod presence;
pub mod registry;
pub mod router;
// endregion: --- Modules

// region: --- Re-exports
pub use connection::{ConnectionHandle, ConnectionId, Outbound, OutboundReceiver, TransportError, OUTBOUND_CAPACITY};
pub use presence::{BroadcastReport, PresenceBroadcaster};
pub use registry::ConnectionRegistry;
pub use router::{Delivery, MessageRouter};
// endregion: --- Re-exports
