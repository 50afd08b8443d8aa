/**
 * Presence Store
 *
 * Registry of connected identities, keyed by `identity_key`. At most one
 * entry exists per key; a reconnect or a second tab replaces the previous
 * snapshot (last writer wins).
 *
 * # Ordering
 *
 * `upsert` removes any existing entry before inserting the new one, so there
 * is never a moment with two entries for one key.
 *
 * # Reconnect races
 *
 * A disconnect only removes the entry if it still belongs to the
 * disconnecting connection (`remove_connection`). If the same identity has
 * already reconnected and upserted a newer snapshot, the late disconnect is
 * a no-op and the newer snapshot survives.
 *
 * # Locking
 *
 * The store itself is a plain value. The live hub owns it behind the same
 * mutex as room membership and the connection registry, so every operation
 * runs inside one critical section together with its broadcast.
 */
use std::collections::HashMap;

use crate::shared::identity::{ConnectionId, ConnectionIdentity};

/// Connected identities keyed by identity key
#[derive(Debug, Default, Clone)]
pub struct PresenceStore {
    entries: HashMap<String, ConnectionIdentity>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for `identity.identity_key`
    ///
    /// Returns the snapshot that was replaced, if any.
    pub fn upsert(&mut self, identity: ConnectionIdentity) -> Option<ConnectionIdentity> {
        let previous = self.entries.remove(&identity.identity_key);
        self.entries.insert(identity.identity_key.clone(), identity);
        previous
    }

    /// Remove the entry for a key unconditionally
    pub fn remove(&mut self, identity_key: &str) -> Option<ConnectionIdentity> {
        self.entries.remove(identity_key)
    }

    /// Remove the entry only if it still belongs to `connection_id`
    pub fn remove_connection(
        &mut self,
        identity_key: &str,
        connection_id: ConnectionId,
    ) -> Option<ConnectionIdentity> {
        match self.entries.get(identity_key) {
            Some(current) if current.connection_id == connection_id => {
                self.entries.remove(identity_key)
            }
            _ => None,
        }
    }

    pub fn get(&self, identity_key: &str) -> Option<&ConnectionIdentity> {
        self.entries.get(identity_key)
    }

    /// Current entries, oldest connection first
    pub fn snapshot(&self) -> Vec<ConnectionIdentity> {
        let mut entries: Vec<ConnectionIdentity> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.identity_key.cmp(&b.identity_key))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
