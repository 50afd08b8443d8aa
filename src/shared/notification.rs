//! Notification Records and Kinds
//!
//! The wire contract names a notification by a plain `type` string plus an
//! optional `event` string (`"subscription"` / `"created"`). Internally the
//! template resolver works on [`TemplateKey`], a typed pair checked against
//! the exhaustive [`NotificationKind::events`] table, so a kind/event pair
//! that does not exist can never be looked up by accident.
//!
//! # Records
//!
//! - [`NotificationRow`] - the canonical, English, persisted record
//! - [`NotificationView`] - what a client receives (localized at emit time)
//! - [`NotificationList`] - the response to a list pull

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Recipient id of the shared back-office inbox
pub const ADMIN_INBOX: &str = "admin";

/// Who a dispatch is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// The customer the event is about
    User,
    /// The shared admin inbox
    Admin,
}

/// Canonical notification row, the single source of truth
///
/// Always English. `is_read` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRow {
    pub notification_id: Uuid,
    pub recipient_id: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub event: Option<String>,
    pub for_admin: bool,
    /// Identity fields merged with the event payload; re-rendered at read time
    pub raw_payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to persist a new row; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient_id: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub event: Option<String>,
    pub for_admin: bool,
    pub raw_payload: serde_json::Value,
}

/// Title/body/link produced by the template resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNotification {
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

/// Client-facing view of one notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    pub notification_id: Uuid,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub event: Option<String>,
    pub for_admin: bool,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    /// Build a view from a row, overriding the text fields with a rendering
    pub fn from_row(row: &NotificationRow, rendered: RenderedNotification) -> Self {
        Self {
            notification_id: row.notification_id,
            title: rendered.title,
            body: rendered.body,
            link: rendered.link,
            kind: row.kind.clone(),
            event: row.event.clone(),
            for_admin: row.for_admin,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }

    /// View carrying the canonical English fields as stored
    pub fn canonical(row: &NotificationRow) -> Self {
        Self::from_row(
            row,
            RenderedNotification {
                title: row.title.clone(),
                body: row.body.clone(),
                link: row.link.clone(),
            },
        )
    }
}

/// Response to a list pull
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationList {
    pub items: Vec<NotificationView>,
    pub unread_count: usize,
    pub total: usize,
}

impl NotificationList {
    pub fn new(items: Vec<NotificationView>) -> Self {
        let unread_count = items.iter().filter(|item| !item.is_read).count();
        let total = items.len();
        Self {
            items,
            unread_count,
            total,
        }
    }
}

/// Notification kinds the dictionaries know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Subscription,
    Payment,
    FreeTrial,
    Chat,
    Account,
    /// Fallback for anything unrecognised
    Generic,
}

/// Sub-events of a notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationEvent {
    Created,
    Activated,
    Renewed,
    Expiring,
    Expired,
    Cancelled,
    Received,
    Failed,
    Refunded,
    Requested,
    Approved,
    Rejected,
    NewMessage,
    Welcome,
    PasswordChanged,
    ProfileUpdated,
}

pub const ALL_KINDS: &[NotificationKind] = &[
    NotificationKind::Subscription,
    NotificationKind::Payment,
    NotificationKind::FreeTrial,
    NotificationKind::Chat,
    NotificationKind::Account,
    NotificationKind::Generic,
];

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Payment => "payment",
            Self::FreeTrial => "free_trial",
            Self::Chat => "chat",
            Self::Account => "account",
            Self::Generic => "generic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value.trim())
    }

    /// Events that are valid for this kind
    pub const fn events(self) -> &'static [NotificationEvent] {
        use NotificationEvent::*;
        match self {
            Self::Subscription => &[Created, Activated, Renewed, Expiring, Expired, Cancelled],
            Self::Payment => &[Received, Failed, Refunded],
            Self::FreeTrial => &[Requested, Approved, Rejected, Expired],
            Self::Chat => &[NewMessage],
            Self::Account => &[Welcome, PasswordChanged, ProfileUpdated],
            Self::Generic => &[],
        }
    }
}

impl NotificationEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Activated => "activated",
            Self::Renewed => "renewed",
            Self::Expiring => "expiring",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Received => "received",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NewMessage => "new_message",
            Self::Welcome => "welcome",
            Self::PasswordChanged => "password_changed",
            Self::ProfileUpdated => "profile_updated",
        }
    }
}

/// Typed dictionary lookup key
///
/// `event == None` addresses the kind-level default entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub kind: NotificationKind,
    pub event: Option<NotificationEvent>,
}

impl TemplateKey {
    pub const GENERIC: TemplateKey = TemplateKey {
        kind: NotificationKind::Generic,
        event: None,
    };

    pub const fn kind_default(kind: NotificationKind) -> Self {
        Self { kind, event: None }
    }

    /// Resolve wire strings into a key
    ///
    /// An unknown kind becomes [`TemplateKey::GENERIC`]; an event that does
    /// not belong to the kind is dropped so lookup lands on the kind default.
    pub fn from_wire(kind: &str, event: Option<&str>) -> Self {
        let Some(kind) = NotificationKind::parse(kind) else {
            return Self::GENERIC;
        };
        let event = event.and_then(|name| {
            kind.events()
                .iter()
                .copied()
                .find(|candidate| candidate.as_str() == name.trim())
        });
        Self { kind, event }
    }

    /// Every key a complete dictionary should define
    pub fn all() -> Vec<TemplateKey> {
        ALL_KINDS
            .iter()
            .flat_map(|kind| {
                std::iter::once(Self::kind_default(*kind)).chain(
                    kind.events().iter().map(move |event| Self {
                        kind: *kind,
                        event: Some(*event),
                    }),
                )
            })
            .collect()
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            Some(event) => write!(f, "{}.{}", self.kind.as_str(), event.as_str()),
            None => f.write_str(self.kind.as_str()),
        }
    }
}
