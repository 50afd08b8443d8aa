/**
 * Connection Registry and Fan-out
 *
 * Maps every live connection id to its current transport handle: the
 * connection's identity snapshot plus the sending half of its outbox.
 *
 * # Outboxes
 *
 * Each socket owns an unbounded `tokio::sync::mpsc` channel. The socket's
 * writer task drains it onto the wire, so pushing an event never awaits and
 * can happen while the hub lock is held. Events for one connection leave in
 * the order they were pushed.
 *
 * # Resolution at send time
 *
 * Nothing outside the registry keeps a sender. Every send resolves the
 * connection id here, so a closed or replaced connection is simply skipped
 * instead of being written to through a stale handle.
 */

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::shared::event::ServerEvent;
use crate::shared::identity::{ConnectionId, ConnectionIdentity};

/// Sending half of a connection's outbox
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Receiving half, drained by the socket writer
pub type OutboxReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Create a fresh outbox pair
pub fn outbox() -> (Outbox, OutboxReceiver) {
    mpsc::unbounded_channel()
}

/// Current transport handle of one connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub identity: ConnectionIdentity,
    outbox: Outbox,
}

impl ConnectionHandle {
    /// Push an event; `false` once the socket writer has gone away
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}

/// All live connections of this process
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, identity: ConnectionIdentity, outbox: Outbox) {
        self.connections.insert(
            identity.connection_id,
            ConnectionHandle { identity, outbox },
        );
    }

    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<ConnectionHandle> {
        self.connections.remove(&connection_id)
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<&ConnectionHandle> {
        self.connections.get(&connection_id)
    }

    pub fn get_mut(&mut self, connection_id: ConnectionId) -> Option<&mut ConnectionHandle> {
        self.connections.get_mut(&connection_id)
    }

    /// Send to one connection
    pub fn send(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        match self.connections.get(&connection_id) {
            Some(handle) => handle.send(event),
            None => {
                tracing::debug!("[Realtime] Dropping {} for closed connection {}", event.name(), connection_id);
                false
            }
        }
    }

    /// Send a copy of `event` to each target
    ///
    /// # Returns
    ///
    /// Number of connections the event was handed to
    pub fn send_many(&self, targets: &[ConnectionId], event: &ServerEvent) -> usize {
        let delivered = targets
            .iter()
            .filter(|id| self.send(**id, event.clone()))
            .count();
        tracing::debug!("[Realtime] {} fanned out to {}/{} connections", event.name(), delivered, targets.len());
        delivered
    }

    /// Live connections of one identity, oldest first
    pub fn connections_of(&self, identity_key: &str) -> Vec<&ConnectionHandle> {
        let mut handles: Vec<&ConnectionHandle> = self
            .connections
            .values()
            .filter(|handle| handle.identity.identity_key == identity_key)
            .collect();
        handles.sort_by_key(|handle| handle.identity.connected_at);
        handles
    }

    pub fn admin_connections(&self) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|handle| handle.identity.role.is_admin())
            .map(|handle| handle.identity.connection_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
