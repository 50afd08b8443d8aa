//! Recipient directory collaborator
//!
//! Read-only access to the profile fields the dispatcher needs for the
//! secondary channel: contact address, the email opt-in flag and the stored
//! locale preference.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::backend::error::StoreError;

/// Profile fields of one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientProfile {
    pub id: String,
    pub email: Option<String>,
    /// Opt-in flag for secondary (email) delivery
    pub email_notifications: bool,
    /// Stored preference, not yet normalized
    pub locale: Option<String>,
}

#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Look up a recipient; `None` for unknown ids (guests, the admin inbox)
    async fn profile(&self, recipient_id: &str) -> Result<Option<RecipientProfile>, StoreError>;
}

/// Process-local directory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    profiles: Arc<RwLock<HashMap<String, RecipientProfile>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, profile: RecipientProfile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryDirectory {
    async fn profile(&self, recipient_id: &str) -> Result<Option<RecipientProfile>, StoreError> {
        Ok(self.profiles.read().await.get(recipient_id).cloned())
    }
}
