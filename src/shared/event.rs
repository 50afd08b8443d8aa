/**
 * Real-time Event Contract
 *
 * This module defines the frames exchanged over the live transport. Every
 * frame is a JSON object of the shape `{"event": "<name>", "data": {...}}`.
 *
 * # Outbound (server → client)
 *
 * - `notification_received` - one new item, locale-appropriate fields
 * - `notifications_list_refresh` - recipient id only, a nudge to re-pull
 * - `notifications_list` - full list + unread count + total
 * - `locale_changed` - acknowledgement to the requesting connection only
 * - `*_room_users_update` - room id + current membership list
 * - `room_message`, `online_users_update`, `error`
 *
 * # Inbound (client → server)
 *
 * Room joins/leaves, messages, locale changes and notification list
 * operations. See [`ClientEvent`].
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::identity::ConnectionIdentity;
use crate::shared::locale::Locale;
use crate::shared::notification::{NotificationList, NotificationView};

/// Event names as they appear on the wire
pub mod names {
    pub const NOTIFICATION_RECEIVED: &str = "notification_received";
    pub const NOTIFICATIONS_LIST_REFRESH: &str = "notifications_list_refresh";
    pub const NOTIFICATIONS_LIST: &str = "notifications_list";
    pub const LOCALE_CHANGED: &str = "locale_changed";
    pub const FETCH_NOTIFICATIONS: &str = "fetch_notifications";
    pub const MARK_NOTIFICATION_READ: &str = "mark_notification_read";
}

/// Longest accepted room identifier
pub const MAX_ROOM_ID_LEN: usize = 128;

/// Longest accepted chat message body, in characters
pub const MAX_MESSAGE_LEN: usize = 4000;

/// Flavour of a membership list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    /// Two-party admin ↔ user conversation
    Private,
    /// Many-to-many public conversation
    Public,
    /// The single shared discovery lobby
    Lobby,
}

/// Membership broadcast payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUsersUpdate {
    pub room_id: String,
    pub users: Vec<ConnectionIdentity>,
}

/// A chat line relayed to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessage {
    pub kind: RoomKind,
    pub room_id: String,
    pub from: String,
    pub display_name: String,
    pub body: String,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}

/// Events pushed from the server to a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NotificationReceived(NotificationView),
    NotificationsListRefresh { recipient_id: String },
    NotificationsList(NotificationList),
    LocaleChanged { locale: Locale },
    PrivateRoomUsersUpdate(RoomUsersUpdate),
    PublicRoomUsersUpdate(RoomUsersUpdate),
    LobbyRoomUsersUpdate(RoomUsersUpdate),
    RoomMessage(RoomMessage),
    OnlineUsersUpdate { users: Vec<ConnectionIdentity> },
    Error { code: String, message: String },
}

impl ServerEvent {
    /// Membership update event for a room of the given kind
    pub fn room_users_update(
        kind: RoomKind,
        room_id: impl Into<String>,
        users: Vec<ConnectionIdentity>,
    ) -> Self {
        let update = RoomUsersUpdate {
            room_id: room_id.into(),
            users,
        };
        match kind {
            RoomKind::Private => Self::PrivateRoomUsersUpdate(update),
            RoomKind::Public => Self::PublicRoomUsersUpdate(update),
            RoomKind::Lobby => Self::LobbyRoomUsersUpdate(update),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotificationReceived(_) => names::NOTIFICATION_RECEIVED,
            Self::NotificationsListRefresh { .. } => names::NOTIFICATIONS_LIST_REFRESH,
            Self::NotificationsList(_) => names::NOTIFICATIONS_LIST,
            Self::LocaleChanged { .. } => names::LOCALE_CHANGED,
            Self::PrivateRoomUsersUpdate(_) => "private_room_users_update",
            Self::PublicRoomUsersUpdate(_) => "public_room_users_update",
            Self::LobbyRoomUsersUpdate(_) => "lobby_room_users_update",
            Self::RoomMessage(_) => "room_message",
            Self::OnlineUsersUpdate { .. } => "online_users_update",
            Self::Error { .. } => "error",
        }
    }
}

/// Events sent by a client over its connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SetLocale { locale: String },
    JoinPrivateRoom { room_id: String },
    LeavePrivateRoom { room_id: String },
    JoinPublicRoom { room_id: String },
    LeavePublicRoom { room_id: String },
    JoinLobby,
    LeaveLobby,
    SendMessage { kind: RoomKind, room_id: String, body: String },
    FetchNotifications,
    MarkNotificationRead { notification_id: Uuid },
    DeleteNotification { notification_id: Uuid },
    MarkAllNotificationsRead,
    ClearNotifications,
}

impl ClientEvent {
    /// Decode one text frame
    pub fn decode(frame: &str) -> Result<Self, SharedError> {
        serde_json::from_str(frame).map_err(|e| SharedError::protocol(e.to_string()))
    }
}

/// Reject empty, oversized or oddly-shaped room identifiers
pub fn validate_room_id(room_id: &str) -> Result<(), SharedError> {
    if room_id.is_empty() {
        return Err(SharedError::validation("room_id", "Room id cannot be empty"));
    }
    if room_id.len() > MAX_ROOM_ID_LEN {
        return Err(SharedError::validation(
            "room_id",
            format!("Room id longer than {} bytes", MAX_ROOM_ID_LEN),
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.');
    if !room_id.chars().all(allowed) {
        return Err(SharedError::validation("room_id", "Room id contains invalid characters"));
    }
    Ok(())
}

/// Reject blank or oversized message bodies, returning the trimmed body
pub fn validate_message_body(body: &str) -> Result<&str, SharedError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(SharedError::validation("body", "Message body cannot be empty"));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LEN {
        return Err(SharedError::validation(
            "body",
            format!("Message body longer than {} characters", MAX_MESSAGE_LEN),
        ));
    }
    Ok(trimmed)
}
