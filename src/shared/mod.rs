//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the client and the backend. These types define the live wire contract
//! (socket events), the notification records, connection identities and the
//! supported locale set.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! and transmission over the live transport.

/// Real-time event contract
pub mod event;

/// Shared error types
pub mod error;

/// Supported locales and normalization
pub mod locale;

/// Connection identities and roles
pub mod identity;

/// Notification records and typed kinds
pub mod notification;

/// Client configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, NotificationCenterConfig, NotificationCenterConfigBuilder};
pub use error::SharedError;
pub use event::{ClientEvent, RoomKind, RoomUsersUpdate, ServerEvent};
pub use identity::{ConnectionId, ConnectionIdentity, Role};
pub use locale::Locale;
pub use notification::{
    Audience, NewNotification, NotificationList, NotificationRow, NotificationView,
    RenderedNotification, TemplateKey, ADMIN_INBOX,
};
