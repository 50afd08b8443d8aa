/**
 * Room and Lobby Manager
 *
 * Membership lists for private two-party conversations, public multi-party
 * conversations and the single shared lobby.
 *
 * # State machine
 *
 * Rooms are never created or destroyed explicitly: a room goes
 * empty → populated → empty as connections join and leave, and an empty
 * room is simply dropped from the map.
 *
 * # Membership vs. joins
 *
 * A room records one join per connection, in join order. The membership
 * list it exposes is de-duplicated by `identity_key` with the latest join
 * winning, so re-joining replaces rather than duplicates, and a second tab
 * of the same identity does not appear twice.
 *
 * # Broadcasts
 *
 * Every mutation returns the [`RoomBroadcast`]s it caused. The manager does
 * not send anything itself; the live hub delivers each broadcast to the
 * connections listed in `targets` while still holding its lock, so no
 * broadcast ever carries stale membership.
 */
use std::collections::{HashMap, HashSet};

use crate::shared::event::{RoomKind, ServerEvent};
use crate::shared::identity::{ConnectionId, ConnectionIdentity};

/// Room id used for the shared lobby
pub const LOBBY_ROOM_ID: &str = "lobby";

/// Fully-qualified room name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomAddress {
    pub kind: RoomKind,
    pub room_id: String,
}

impl RoomAddress {
    pub fn new(kind: RoomKind, room_id: impl Into<String>) -> Self {
        Self {
            kind,
            room_id: room_id.into(),
        }
    }

    pub fn lobby() -> Self {
        Self::new(RoomKind::Lobby, LOBBY_ROOM_ID)
    }
}

/// Membership delta to deliver to a room's connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBroadcast {
    pub address: RoomAddress,
    /// Membership after the mutation
    pub members: Vec<ConnectionIdentity>,
    /// Connections still joined to the room
    pub targets: Vec<ConnectionId>,
}

impl RoomBroadcast {
    pub fn event(&self) -> ServerEvent {
        ServerEvent::room_users_update(
            self.address.kind,
            self.address.room_id.clone(),
            self.members.clone(),
        )
    }
}

#[derive(Debug, Default)]
struct Room {
    joins: Vec<ConnectionIdentity>,
}

impl Room {
    fn join(&mut self, identity: ConnectionIdentity) {
        self.joins
            .retain(|entry| entry.connection_id != identity.connection_id);
        self.joins.push(identity);
    }

    fn leave(&mut self, connection_id: ConnectionId) -> bool {
        let before = self.joins.len();
        self.joins.retain(|entry| entry.connection_id != connection_id);
        self.joins.len() != before
    }

    fn contains(&self, connection_id: ConnectionId) -> bool {
        self.joins.iter().any(|entry| entry.connection_id == connection_id)
    }

    fn members(&self) -> Vec<ConnectionIdentity> {
        let mut seen = HashSet::new();
        let mut members: Vec<ConnectionIdentity> = self
            .joins
            .iter()
            .rev()
            .filter(|entry| seen.insert(entry.identity_key.clone()))
            .cloned()
            .collect();
        members.reverse();
        members
    }

    fn targets(&self) -> Vec<ConnectionId> {
        self.joins.iter().map(|entry| entry.connection_id).collect()
    }

    fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }
}

/// All rooms of this server process
#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: HashMap<RoomAddress, Room>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room and report the new membership
    pub fn join(&mut self, address: RoomAddress, identity: ConnectionIdentity) -> RoomBroadcast {
        let room = self.rooms.entry(address.clone()).or_default();
        room.join(identity);
        tracing::debug!(
            "[Rooms] Join {:?}/{} -> {} members",
            address.kind,
            address.room_id,
            room.members().len()
        );
        Self::broadcast_for(address, room)
    }

    /// Remove a connection from a room
    ///
    /// Returns `None` when the connection was not joined, so nothing changed.
    pub fn leave(&mut self, address: &RoomAddress, connection_id: ConnectionId) -> Option<RoomBroadcast> {
        let room = self.rooms.get_mut(address)?;
        if !room.leave(connection_id) {
            return None;
        }
        let broadcast = Self::broadcast_for(address.clone(), room);
        if room.is_empty() {
            self.rooms.remove(address);
        }
        tracing::debug!(
            "[Rooms] Leave {:?}/{} -> {} members",
            address.kind,
            address.room_id,
            broadcast.members.len()
        );
        Some(broadcast)
    }

    pub fn join_lobby(&mut self, identity: ConnectionIdentity) -> RoomBroadcast {
        self.join(RoomAddress::lobby(), identity)
    }

    pub fn leave_lobby(&mut self, connection_id: ConnectionId) -> Option<RoomBroadcast> {
        self.leave(&RoomAddress::lobby(), connection_id)
    }

    /// Leave every room the connection is joined to
    ///
    /// Scans private rooms, public rooms and the lobby alike and returns one
    /// broadcast per affected room.
    pub fn leave_all(&mut self, connection_id: ConnectionId) -> Vec<RoomBroadcast> {
        let affected = self.rooms_of(connection_id);
        affected
            .iter()
            .filter_map(|address| self.leave(address, connection_id))
            .collect()
    }

    /// Replace the stored snapshot of a connection (after a locale change)
    pub fn refresh_identity(&mut self, identity: &ConnectionIdentity) -> Vec<RoomBroadcast> {
        let mut broadcasts = Vec::new();
        for (address, room) in self.rooms.iter_mut() {
            let mut touched = false;
            for entry in room.joins.iter_mut() {
                if entry.connection_id == identity.connection_id {
                    *entry = identity.clone();
                    touched = true;
                }
            }
            if touched {
                broadcasts.push(Self::broadcast_for(address.clone(), room));
            }
        }
        broadcasts
    }

    pub fn members(&self, address: &RoomAddress) -> Vec<ConnectionIdentity> {
        self.rooms
            .get(address)
            .map(Room::members)
            .unwrap_or_default()
    }

    /// Connections joined to a room, in join order
    pub fn targets(&self, address: &RoomAddress) -> Vec<ConnectionId> {
        self.rooms
            .get(address)
            .map(Room::targets)
            .unwrap_or_default()
    }

    pub fn is_joined(&self, address: &RoomAddress, connection_id: ConnectionId) -> bool {
        self.rooms
            .get(address)
            .is_some_and(|room| room.contains(connection_id))
    }

    /// Every room a connection is currently joined to
    pub fn rooms_of(&self, connection_id: ConnectionId) -> Vec<RoomAddress> {
        self.rooms
            .iter()
            .filter(|(_, room)| room.contains(connection_id))
            .map(|(address, _)| address.clone())
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn broadcast_for(address: RoomAddress, room: &Room) -> RoomBroadcast {
        RoomBroadcast {
            address,
            members: room.members(),
            targets: room.targets(),
        }
    }
}
