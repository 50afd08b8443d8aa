/**
 * Client Event Handler
 *
 * Runs one decoded `ClientEvent` for one connection to completion. Every
 * failure becomes an `error` event to the calling connection only; the
 * socket is never closed because of a bad frame.
 *
 * Private room messages also raise a `chat/new_message` notification:
 * customers writing in their support conversation notify the admin inbox,
 * admins writing in it notify the customer who owns it.
 */

use serde_json::json;

use crate::backend::error::BackendError;
use crate::backend::notifications::dispatcher::{DispatchRequest, Inbox, NotificationDispatcher, RecipientIdentity};
use crate::backend::realtime::hub::LiveHub;
use crate::backend::rooms::RoomAddress;
use crate::shared::event::{validate_message_body, validate_room_id, ClientEvent, RoomKind, RoomMessage, ServerEvent};
use crate::shared::identity::{ConnectionId, ConnectionIdentity};
use crate::shared::locale::Locale;
use crate::shared::notification::Audience;

/// Characters of a chat line quoted in its notification
const PREVIEW_CHARS: usize = 80;

/// Shorten a chat line for a notification body
pub fn message_preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_CHARS {
        return body.to_string();
    }
    let mut preview: String = body.chars().take(PREVIEW_CHARS).collect();
    preview.push('…');
    preview
}

/// Per-event logic shared by every socket
#[derive(Clone)]
pub struct EventHandler {
    dispatcher: NotificationDispatcher,
    default_locale: Locale,
}

impl EventHandler {
    pub fn new(dispatcher: NotificationDispatcher, default_locale: Locale) -> Self {
        Self {
            dispatcher,
            default_locale,
        }
    }

    pub fn hub(&self) -> &LiveHub {
        self.dispatcher.hub()
    }

    /// Decode and run one text frame, answering failures with an `error` event
    pub async fn handle_frame(&self, connection_id: ConnectionId, frame: &str) {
        let result = match ClientEvent::decode(frame) {
            Ok(event) => self.handle(connection_id, event).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            self.report(connection_id, &e);
        }
    }

    /// Run one event
    pub async fn handle(&self, connection_id: ConnectionId, event: ClientEvent) -> Result<(), BackendError> {
        let identity = self
            .hub()
            .identity(connection_id)
            .ok_or_else(|| BackendError::not_found("connection"))?;

        match event {
            ClientEvent::SetLocale { locale } => {
                let locale = Locale::normalize(Some(&locale), self.default_locale);
                self.hub().set_locale(connection_id, locale)?;
            }
            ClientEvent::JoinPrivateRoom { room_id } => self.join(connection_id, RoomKind::Private, room_id)?,
            ClientEvent::JoinPublicRoom { room_id } => self.join(connection_id, RoomKind::Public, room_id)?,
            ClientEvent::JoinLobby => self.hub().join_room(connection_id, RoomAddress::lobby())?,
            ClientEvent::LeavePrivateRoom { room_id } => self.leave(connection_id, RoomKind::Private, room_id)?,
            ClientEvent::LeavePublicRoom { room_id } => self.leave(connection_id, RoomKind::Public, room_id)?,
            ClientEvent::LeaveLobby => {
                self.hub().leave_room(connection_id, &RoomAddress::lobby());
            }
            ClientEvent::SendMessage { kind, room_id, body } => {
                self.send_message(connection_id, &identity, kind, room_id, &body).await?;
            }
            ClientEvent::FetchNotifications => {
                let list = self
                    .dispatcher
                    .fetch_list(&inbox_of(&identity), identity.locale)
                    .await?;
                self.hub()
                    .send_to_connection(connection_id, ServerEvent::NotificationsList(list));
            }
            ClientEvent::MarkNotificationRead { notification_id } => {
                self.dispatcher
                    .mark_read(&inbox_of(&identity), notification_id)
                    .await?;
            }
            ClientEvent::DeleteNotification { notification_id } => {
                self.dispatcher
                    .delete(&inbox_of(&identity), notification_id)
                    .await?;
            }
            ClientEvent::MarkAllNotificationsRead => {
                self.dispatcher.mark_all_read(&inbox_of(&identity)).await?;
            }
            ClientEvent::ClearNotifications => {
                self.dispatcher.clear_all(&inbox_of(&identity)).await?;
            }
        }
        Ok(())
    }

    fn join(&self, connection_id: ConnectionId, kind: RoomKind, room_id: String) -> Result<(), BackendError> {
        validate_room_id(&room_id)?;
        self.hub().join_room(connection_id, RoomAddress::new(kind, room_id))
    }

    fn leave(&self, connection_id: ConnectionId, kind: RoomKind, room_id: String) -> Result<(), BackendError> {
        validate_room_id(&room_id)?;
        if !self.hub().leave_room(connection_id, &RoomAddress::new(kind, room_id.clone())) {
            tracing::debug!("[Socket] {} left {} without being joined", connection_id, room_id);
        }
        Ok(())
    }

    async fn send_message(
        &self,
        connection_id: ConnectionId,
        sender: &ConnectionIdentity,
        kind: RoomKind,
        room_id: String,
        body: &str,
    ) -> Result<(), BackendError> {
        let address = match kind {
            RoomKind::Lobby => RoomAddress::lobby(),
            _ => {
                validate_room_id(&room_id)?;
                RoomAddress::new(kind, room_id)
            }
        };
        let body = validate_message_body(body)?;
        let message = self.hub().relay_message(connection_id, &address, body)?;

        // The message is already delivered; a failed notification stays server-side
        if kind == RoomKind::Private {
            if let Err(e) = self.notify_private_message(sender, &message).await {
                tracing::error!(
                    "[Socket] Message {} relayed but notification failed: {}",
                    message.room_id,
                    e
                );
            }
        }
        Ok(())
    }

    async fn notify_private_message(
        &self,
        sender: &ConnectionIdentity,
        message: &RoomMessage,
    ) -> Result<(), BackendError> {
        let (audience, identity) = if sender.role.is_admin() {
            (Audience::User, RecipientIdentity::new(message.room_id.clone()))
        } else {
            (Audience::Admin, RecipientIdentity::from(sender))
        };

        self.dispatcher
            .dispatch(DispatchRequest {
                audience,
                kind: "chat".to_string(),
                event: Some("new_message".to_string()),
                identity,
                payload: json!({
                    "from": message.display_name,
                    "preview": message_preview(&message.body),
                    "room_id": message.room_id,
                }),
            })
            .await?;
        Ok(())
    }

    /// Answer a failed event with an `error` event to that connection only
    pub fn report(&self, connection_id: ConnectionId, error: &BackendError) {
        let is_admin = self
            .hub()
            .identity(connection_id)
            .is_some_and(|identity| identity.role.is_admin());
        tracing::warn!("[Socket] {} event failed: {}", connection_id, error);
        self.hub()
            .send_to_connection(connection_id, error.to_event(is_admin));
    }
}

fn inbox_of(identity: &ConnectionIdentity) -> Inbox {
    Inbox::for_identity(&identity.identity_key, identity.role)
}
