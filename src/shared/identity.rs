//! Connection Identity
//!
//! One [`ConnectionIdentity`] exists per live connection. It is created on
//! connect, mutated only by locale updates, and dropped on disconnect. The
//! `identity_key` is what presence and room membership de-duplicate on: the
//! user id for authenticated roles, a cookie-derived pseudo id for guests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::locale::Locale;

/// Identifier of one live connection (one socket, one browser tab)
pub type ConnectionId = Uuid;

/// Who is on the other end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Anonymous visitor identified by a cookie
    Guest,
    /// Logged-in customer
    User,
    /// Back-office operator
    Admin,
}

impl Role {
    /// Parse a role claim; anything unrecognised is treated as a plain user
    pub fn from_claim(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("admin") => Self::Admin,
            _ => Self::User,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Snapshot of one live connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionIdentity {
    /// Stable de-duplication key (user id or guest pseudo id)
    pub identity_key: String,
    /// Role established at handshake time
    pub role: Role,
    /// Name shown in room member lists
    pub display_name: String,
    /// Outbound locale for this connection
    pub locale: Locale,
    /// The connection this snapshot belongs to
    pub connection_id: ConnectionId,
    /// When the connection was accepted
    pub connected_at: DateTime<Utc>,
}

impl ConnectionIdentity {
    /// Create a snapshot for a freshly accepted connection
    pub fn new(
        identity_key: impl Into<String>,
        role: Role,
        display_name: impl Into<String>,
        locale: Locale,
    ) -> Self {
        Self {
            identity_key: identity_key.into(),
            role,
            display_name: display_name.into(),
            locale,
            connection_id: Uuid::new_v4(),
            connected_at: Utc::now(),
        }
    }

    /// Identity fields exposed to notification templates
    ///
    /// These are merged underneath the event payload, so a payload can
    /// override any of them.
    pub fn template_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        fields.insert("user_id".into(), self.identity_key.clone().into());
        fields.insert("identity_key".into(), self.identity_key.clone().into());
        fields.insert("display_name".into(), self.display_name.clone().into());
        fields.insert("username".into(), self.display_name.clone().into());
        fields.insert("locale".into(), self.locale.code().into());
        fields.insert(
            "role".into(),
            serde_json::to_value(self.role).unwrap_or(serde_json::Value::Null),
        );
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_gets_fresh_connection_id() {
        let a = ConnectionIdentity::new("u1", Role::User, "Anna", Locale::Is);
        let b = ConnectionIdentity::new("u1", Role::User, "Anna", Locale::Is);
        assert_eq!(a.identity_key, b.identity_key);
        assert_ne!(a.connection_id, b.connection_id);
    }

    #[test]
    fn test_role_from_claim() {
        assert_eq!(Role::from_claim(Some("ADMIN")), Role::Admin);
        assert_eq!(Role::from_claim(Some("user")), Role::User);
        assert_eq!(Role::from_claim(None), Role::User);
    }

    #[test]
    fn test_template_fields() {
        let identity = ConnectionIdentity::new("u1", Role::Admin, "Jón", Locale::Is);
        let fields = identity.template_fields();
        assert_eq!(fields["user_id"], "u1");
        assert_eq!(fields["display_name"], "Jón");
        assert_eq!(fields["locale"], "is");
        assert_eq!(fields["role"], "admin");
    }
}
