/**
 * Live Hub
 *
 * The single owner of all cross-connection mutable state of this process:
 * the connection registry, the presence store and room membership.
 *
 * # Critical section
 *
 * All three live behind one `std::sync::Mutex`. Every public operation takes
 * the lock once, mutates, and pushes the resulting broadcasts into the
 * affected outboxes before releasing it. Nothing awaits while the lock is
 * held (outbox sends are synchronous), so broadcasts always carry the
 * membership that was current at the moment of the mutation and two
 * concurrent mutations can never interleave their broadcasts.
 *
 * # Deployment
 *
 * This state is per process. Running several instances behind a load
 * balancer requires moving presence and membership into a shared store.
 */

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::backend::error::BackendError;
use crate::backend::presence::PresenceStore;
use crate::backend::realtime::broadcast::{ConnectionRegistry, Outbox};
use crate::backend::rooms::{may_join_private, RoomAddress, RoomBroadcast, RoomManager};
use crate::shared::event::{RoomKind, RoomMessage, ServerEvent};
use crate::shared::identity::{ConnectionId, ConnectionIdentity};
use crate::shared::locale::Locale;

#[derive(Debug, Default)]
struct HubState {
    registry: ConnectionRegistry,
    presence: PresenceStore,
    rooms: RoomManager,
}

impl HubState {
    fn deliver(&self, broadcasts: &[RoomBroadcast]) {
        for broadcast in broadcasts {
            self.registry.send_many(&broadcast.targets, &broadcast.event());
        }
    }

    /// Push the presence snapshot to every admin connection
    fn broadcast_online(&self) {
        let event = ServerEvent::OnlineUsersUpdate {
            users: self.presence.snapshot(),
        };
        self.registry
            .send_many(&self.registry.admin_connections(), &event);
    }

    fn identity(&self, connection_id: ConnectionId) -> Result<ConnectionIdentity, BackendError> {
        self.registry
            .get(connection_id)
            .map(|handle| handle.identity.clone())
            .ok_or_else(|| BackendError::not_found("connection"))
    }
}

/// What a disconnect cleaned up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectReport {
    /// Membership broadcasts sent, one per room the connection was in
    pub room_broadcasts: usize,
    /// Whether the presence entry went away (no other tab left)
    pub went_offline: bool,
}

/// Shared handle to the live state of this process
#[derive(Debug, Clone, Default)]
pub struct LiveHub {
    inner: Arc<Mutex<HubState>>,
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a freshly accepted connection and mark its identity online
    pub fn connect(&self, identity: ConnectionIdentity, outbox: Outbox) {
        let mut state = self.lock();
        tracing::info!(
            "[Hub] {} connected as {:?} ({}), locale {}",
            identity.identity_key,
            identity.role,
            identity.connection_id,
            identity.locale
        );
        state.registry.register(identity.clone(), outbox);
        state.presence.upsert(identity);
        state.broadcast_online();
    }

    /// Tear down a connection
    ///
    /// Leaves every room, lobby included, broadcasting once per affected
    /// room, then drops the presence entry if it still belongs to this
    /// connection. If another tab of the same identity is still connected,
    /// that tab's snapshot takes over the presence entry.
    pub fn disconnect(&self, connection_id: ConnectionId) -> DisconnectReport {
        let mut state = self.lock();
        let Some(handle) = state.registry.unregister(connection_id) else {
            return DisconnectReport::default();
        };
        let key = handle.identity.identity_key.clone();

        let broadcasts = state.rooms.leave_all(connection_id);
        state.deliver(&broadcasts);

        let mut went_offline = false;
        if state.presence.remove_connection(&key, connection_id).is_some() {
            let survivor = state
                .registry
                .connections_of(&key)
                .last()
                .map(|other| other.identity.clone());
            match survivor {
                Some(other) => {
                    state.presence.upsert(other);
                }
                None => went_offline = true,
            }
        }
        state.broadcast_online();

        tracing::info!(
            "[Hub] {} disconnected ({}), left {} rooms",
            key,
            connection_id,
            broadcasts.len()
        );
        DisconnectReport {
            room_broadcasts: broadcasts.len(),
            went_offline,
        }
    }

    /// Join a room, enforcing private room ownership
    pub fn join_room(&self, connection_id: ConnectionId, address: RoomAddress) -> Result<(), BackendError> {
        let mut state = self.lock();
        let identity = state.identity(connection_id)?;
        if address.kind == RoomKind::Private && !may_join_private(&identity, &address.room_id) {
            tracing::warn!(
                "[Hub] {} denied private room {}",
                identity.identity_key,
                address.room_id
            );
            return Err(BackendError::unauthorized("not allowed to join this conversation"));
        }
        let broadcast = state.rooms.join(address, identity);
        state.deliver(std::slice::from_ref(&broadcast));
        Ok(())
    }

    /// Leave a room; `false` when the connection was not joined
    pub fn leave_room(&self, connection_id: ConnectionId, address: &RoomAddress) -> bool {
        let mut state = self.lock();
        match state.rooms.leave(address, connection_id) {
            Some(broadcast) => {
                state.deliver(std::slice::from_ref(&broadcast));
                true
            }
            None => false,
        }
    }

    /// Change a connection's outbound locale
    ///
    /// Idempotent: when the normalized locale equals the current one nothing
    /// is sent. Otherwise the connection alone receives `locale_changed`, and
    /// rooms holding its snapshot re-broadcast their membership.
    pub fn set_locale(&self, connection_id: ConnectionId, locale: Locale) -> Result<bool, BackendError> {
        let mut state = self.lock();
        let mut identity = state.identity(connection_id)?;
        if identity.locale == locale {
            return Ok(false);
        }
        identity.locale = locale;

        if let Some(handle) = state.registry.get_mut(connection_id) {
            handle.identity.locale = locale;
        }
        let owns_presence = state
            .presence
            .get(&identity.identity_key)
            .is_some_and(|entry| entry.connection_id == connection_id);
        if owns_presence {
            state.presence.upsert(identity.clone());
        }
        let broadcasts = state.rooms.refresh_identity(&identity);

        state.registry.send(connection_id, ServerEvent::LocaleChanged { locale });
        state.deliver(&broadcasts);
        if owns_presence {
            state.broadcast_online();
        }
        tracing::debug!("[Hub] {} switched to {}", identity.identity_key, locale);
        Ok(true)
    }

    /// Relay a chat line to every connection joined to the room
    ///
    /// The sender must itself be joined. `body` is expected to be validated.
    pub fn relay_message(
        &self,
        connection_id: ConnectionId,
        address: &RoomAddress,
        body: &str,
    ) -> Result<RoomMessage, BackendError> {
        let state = self.lock();
        let identity = state.identity(connection_id)?;
        if !state.rooms.is_joined(address, connection_id) {
            tracing::warn!(
                "[Hub] {} tried to post to {} without joining",
                identity.identity_key,
                address.room_id
            );
            return Err(BackendError::unauthorized("not a member of this room"));
        }
        let message = RoomMessage {
            kind: address.kind,
            room_id: address.room_id.clone(),
            from: identity.identity_key.clone(),
            display_name: identity.display_name.clone(),
            body: body.to_string(),
            sent_at: Utc::now(),
        };
        let targets = state.rooms.targets(address);
        state
            .registry
            .send_many(&targets, &ServerEvent::RoomMessage(message.clone()));
        Ok(message)
    }

    /// Send to one connection
    pub fn send_to_connection(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        self.lock().registry.send(connection_id, event)
    }

    /// Send one event to every connection of an identity
    pub fn send_to_identity(&self, identity_key: &str, event: &ServerEvent) -> usize {
        let state = self.lock();
        let targets: Vec<ConnectionId> = state
            .registry
            .connections_of(identity_key)
            .iter()
            .map(|handle| handle.identity.connection_id)
            .collect();
        state.registry.send_many(&targets, event)
    }

    /// Send a per-connection event to every connection of an identity
    ///
    /// `render` is called once per connection with that connection's
    /// snapshot, so each tab can get its own locale.
    pub fn send_rendered<F>(&self, identity_key: &str, render: F) -> usize
    where
        F: Fn(&ConnectionIdentity) -> ServerEvent,
    {
        let state = self.lock();
        state
            .registry
            .connections_of(identity_key)
            .iter()
            .filter(|handle| handle.send(render(&handle.identity)))
            .count()
    }

    pub fn send_to_admins(&self, event: &ServerEvent) -> usize {
        let state = self.lock();
        state
            .registry
            .send_many(&state.registry.admin_connections(), event)
    }

    pub fn identity(&self, connection_id: ConnectionId) -> Option<ConnectionIdentity> {
        self.lock().identity(connection_id).ok()
    }

    /// Locale of the identity's most recent live connection
    pub fn live_locale(&self, identity_key: &str) -> Option<Locale> {
        self.lock()
            .registry
            .connections_of(identity_key)
            .last()
            .map(|handle| handle.identity.locale)
    }

    pub fn is_online(&self, identity_key: &str) -> bool {
        self.lock().presence.get(identity_key).is_some()
    }

    pub fn presence_snapshot(&self) -> Vec<ConnectionIdentity> {
        self.lock().presence.snapshot()
    }

    pub fn room_members(&self, address: &RoomAddress) -> Vec<ConnectionIdentity> {
        self.lock().rooms.members(address)
    }

    pub fn rooms_of(&self, connection_id: ConnectionId) -> Vec<RoomAddress> {
        self.lock().rooms.rooms_of(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.lock().registry.len()
    }
}
