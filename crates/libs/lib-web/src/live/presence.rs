//! # Presence Broadcaster
//!
//! Pushes the full online set to every live connection. Delivery is
//! fire-and-forget: a closed or full connection is logged and skipped, and never stops
//! delivery to the rest.

use shared::dto::{LiveEvent, UserId};
use tracing::{debug, warn};

use super::connection::ConnectionHandle;

/// Outcome of one broadcast, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PresenceBroadcaster;

impl PresenceBroadcaster {
    pub fn new() -> Self {
        Self
    }

    /// Push `online_user_ids` to every handle in `connections`.
    pub fn broadcast<'a>(
        &self,
        connections: impl IntoIterator<Item = &'a ConnectionHandle>,
        online_user_ids: &[UserId],
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for handle in connections {
            let event = LiveEvent::PresenceUpdate {
                online_user_ids: online_user_ids.to_vec(),
            };
            match handle.push(event) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        user_id = handle.user_id(),
                        connection_id = %handle.id(),
                        error = %e,
                        "[LIVE] PRESENCE_DROPPED user_id={} error={}",
                        handle.user_id(),
                        e
                    );
                }
            }
        }

        debug!(
            online = online_user_ids.len(),
            delivered = report.delivered,
            failed = report.failed,
            "[LIVE] PRESENCE_BROADCAST online={:?}",
            online_user_ids
        );

        report
    }
}
