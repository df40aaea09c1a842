//! # Connection Registry
//!
//! Maps each user id to at most one live connection. The key set of the map is
//! the online set; nothing else stores presence.
//!
//! ## Ordering
//!
//! A mutation takes the write lock, then downgrades it to a read lock and
//! broadcasts the new online set while still holding it. The change is visible
//! to every `lookup` before any client hears about it, and two concurrent
//! mutations cannot deliver their presence snapshots out of order.
//!
//! ## Replacement
//!
//! `register` for a user that is already connected closes the previous
//! connection (last writer wins). The replaced connection's task later calls
//! [`ConnectionRegistry::release`] with its own id, which leaves the newer
//! entry alone.

use std::collections::HashMap;

use parking_lot::{RwLock, RwLockWriteGuard};
use shared::dto::UserId;
use tracing::info;

use super::connection::{ConnectionHandle, ConnectionId};
use super::presence::PresenceBroadcaster;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, ConnectionHandle>>,
    presence: PresenceBroadcaster,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to its user, closing any connection it replaces.
    ///
    /// Returns the replaced handle, if there was one.
    pub fn register(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let user_id = handle.user_id();
        let connection_id = handle.id();

        let mut connections = self.connections.write();
        let replaced = connections.insert(user_id, handle);
        if let Some(old) = &replaced {
            old.close();
        }

        info!(
            user_id,
            connection_id = %connection_id,
            replaced = replaced.is_some(),
            online = connections.len(),
            "[LIVE] REGISTERED user_id={} replaced={}",
            user_id,
            replaced.is_some()
        );

        self.broadcast_after(connections);
        replaced
    }

    /// Remove and close the connection of `user_id`. No-op if absent.
    pub fn unregister(&self, user_id: UserId) -> bool {
        let mut connections = self.connections.write();
        let Some(removed) = connections.remove(&user_id) else {
            return false;
        };
        removed.close();

        info!(user_id, online = connections.len(), "[LIVE] UNREGISTERED user_id={}", user_id);

        self.broadcast_after(connections);
        true
    }

    /// Remove the entry of `user_id` only if it still belongs to
    /// `connection_id`.
    pub fn release(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write();
        match connections.get(&user_id) {
            Some(current) if current.id() == connection_id => {}
            _ => return false,
        }
        connections.remove(&user_id);

        info!(
            user_id,
            connection_id = %connection_id,
            online = connections.len(),
            "[LIVE] RELEASED user_id={}",
            user_id
        );

        self.broadcast_after(connections);
        true
    }

    pub fn lookup(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.connections.read().get(&user_id).cloned()
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.connections.read().contains_key(&user_id)
    }

    /// Snapshot of the online set, ascending.
    pub fn online_user_ids(&self) -> Vec<UserId> {
        sorted_ids(&self.connections.read())
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    fn broadcast_after(&self, connections: RwLockWriteGuard<'_, HashMap<UserId, ConnectionHandle>>) {
        let connections = RwLockWriteGuard::downgrade(connections);
        let online = sorted_ids(&connections);
        self.presence.broadcast(connections.values(), &online);
    }
}

fn sorted_ids(connections: &HashMap<UserId, ConnectionHandle>) -> Vec<UserId> {
    let mut ids: Vec<UserId> = connections.keys().copied().collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::connection::{Outbound, OutboundReceiver};
    use shared::dto::LiveEvent;

    fn presence(ids: &[UserId]) -> Outbound {
        Outbound::Event(LiveEvent::PresenceUpdate { online_user_ids: ids.to_vec() })
    }

    fn drain(rx: &mut OutboundReceiver) -> Vec<Outbound> {
        let mut items = Vec::new();
        while let Ok(item) = rx.try_recv() {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_register_broadcasts_to_everyone_including_newcomer() {
        // Arrange
        let registry = ConnectionRegistry::new();
        let (u1, mut rx1) = ConnectionHandle::new(1);
        let (u2, mut rx2) = ConnectionHandle::new(2);

        // Act
        registry.register(u1);
        registry.register(u2);

        // Assert
        assert_eq!(drain(&mut rx1), vec![presence(&[1]), presence(&[1, 2])]);
        assert_eq!(drain(&mut rx2), vec![presence(&[1, 2])]);
    }

    #[test]
    fn test_reregister_replaces_and_closes_previous() {
        let registry = ConnectionRegistry::new();
        let (first, mut rx_first) = ConnectionHandle::new(1);
        let (second, mut rx_second) = ConnectionHandle::new(1);
        let second_id = second.id();

        registry.register(first.clone());
        let replaced = registry.register(second);

        assert_eq!(replaced.map(|h| h.id()), Some(first.id()));
        assert_eq!(registry.lookup(1).map(|h| h.id()), Some(second_id));
        assert_eq!(registry.online_user_ids(), vec![1]);
        assert_eq!(drain(&mut rx_first), vec![presence(&[1]), Outbound::Close]);
        assert_eq!(drain(&mut rx_second), vec![presence(&[1])]);
    }

    #[test]
    fn test_release_of_replaced_connection_keeps_successor() {
        let registry = ConnectionRegistry::new();
        let (first, _rx_first) = ConnectionHandle::new(1);
        let (second, _rx_second) = ConnectionHandle::new(1);
        let (first_id, second_id) = (first.id(), second.id());

        registry.register(first);
        registry.register(second);

        assert!(!registry.release(1, first_id));
        assert_eq!(registry.lookup(1).map(|h| h.id()), Some(second_id));

        assert!(registry.release(1, second_id));
        assert!(registry.lookup(1).is_none());
    }

    #[test]
    fn test_unregister_absent_is_noop_without_broadcast() {
        let registry = ConnectionRegistry::new();
        let (u1, mut rx1) = ConnectionHandle::new(1);
        registry.register(u1);
        drain(&mut rx1);

        assert!(!registry.unregister(42));

        assert!(drain(&mut rx1).is_empty());
        assert_eq!(registry.online_user_ids(), vec![1]);
    }

    #[test]
    fn test_unregister_notifies_remaining_and_closes_removed() {
        let registry = ConnectionRegistry::new();
        let (u1, mut rx1) = ConnectionHandle::new(1);
        let (u2, mut rx2) = ConnectionHandle::new(2);
        registry.register(u1);
        registry.register(u2);
        drain(&mut rx1);
        drain(&mut rx2);

        assert!(registry.unregister(2));

        assert_eq!(drain(&mut rx1), vec![presence(&[1])]);
        assert_eq!(drain(&mut rx2), vec![Outbound::Close]);
        assert!(!registry.is_online(2));
    }

    #[test]
    fn test_online_set_matches_sequence_of_operations() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();

        for id in [5, 3, 9, 3, 1] {
            let (handle, rx) = ConnectionHandle::new(id);
            receivers.push(rx);
            registry.register(handle);
        }
        registry.unregister(9);
        registry.unregister(9);

        assert_eq!(registry.online_user_ids(), vec![1, 3, 5]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_concurrent_registrations_end_with_one_handle_per_user() {
        let registry = std::sync::Arc::new(ConnectionRegistry::new());

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let mut receivers = Vec::new();
                    for _ in 0..50 {
                        let (handle, rx) = ConnectionHandle::new(i % 4);
                        receivers.push(rx);
                        registry.register(handle);
                    }
                    receivers
                })
            })
            .collect();
        let _receivers: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

        assert_eq!(registry.online_user_ids(), vec![0, 1, 2, 3]);
        for user_id in 0..4 {
            let current = registry.lookup(user_id).unwrap();
            assert!(!current.is_closed());
        }
    }
}
