//! Notification store collaborator
//!
//! The canonical rows live in an external data store. The dispatcher only
//! talks to it through [`NotificationStore`]; [`InMemoryNotificationStore`]
//! backs servers started without `DATABASE_URL` and the tests, and
//! `db::PgNotificationStore` backs production.
//!
//! Every operation is scoped by `(recipient_id, for_admin)`: a row that exists
//! but belongs to someone else is indistinguishable from a row that does not
//! exist. A user whose id happens to equal the admin inbox id still never
//! sees admin rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::notification::{NewNotification, NotificationRow};

/// Outcome of marking one row read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkReadOutcome {
    /// The row was unread and is now read
    Updated,
    /// The row was already read; nothing changed
    AlreadyRead,
    /// No such row for this recipient
    NotFound,
}

/// Persistence for canonical notification rows
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist one row, assigning its id and timestamp
    async fn insert(&self, notification: NewNotification) -> Result<NotificationRow, StoreError>;

    /// All rows of a recipient, newest first
    async fn list(&self, recipient_id: &str, for_admin: bool) -> Result<Vec<NotificationRow>, StoreError>;

    async fn mark_read(
        &self,
        recipient_id: &str,
        for_admin: bool,
        notification_id: Uuid,
    ) -> Result<MarkReadOutcome, StoreError>;

    /// Delete one row; `false` when there was nothing to delete
    async fn delete(&self, recipient_id: &str, for_admin: bool, notification_id: Uuid) -> Result<bool, StoreError>;

    /// Mark every unread row read, returning how many changed
    async fn mark_all_read(&self, recipient_id: &str, for_admin: bool) -> Result<u64, StoreError>;

    /// Delete every row of a recipient, returning how many went away
    async fn clear_all(&self, recipient_id: &str, for_admin: bool) -> Result<u64, StoreError>;
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationStore {
    rows: Arc<RwLock<Vec<NotificationRow>>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all recipients
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn owned_by(row: &NotificationRow, recipient_id: &str, for_admin: bool) -> bool {
    row.recipient_id == recipient_id && row.for_admin == for_admin
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: NewNotification) -> Result<NotificationRow, StoreError> {
        let row = NotificationRow {
            notification_id: Uuid::new_v4(),
            recipient_id: notification.recipient_id,
            title: notification.title,
            body: notification.body,
            link: notification.link,
            kind: notification.kind,
            event: notification.event,
            for_admin: notification.for_admin,
            raw_payload: notification.raw_payload,
            is_read: false,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn list(&self, recipient_id: &str, for_admin: bool) -> Result<Vec<NotificationRow>, StoreError> {
        let rows = self.rows.read().await;
        // Insertion order breaks created_at ties
        Ok(rows
            .iter()
            .rev()
            .filter(|row| owned_by(row, recipient_id, for_admin))
            .cloned()
            .collect())
    }

    async fn mark_read(
        &self,
        recipient_id: &str,
        for_admin: bool,
        notification_id: Uuid,
    ) -> Result<MarkReadOutcome, StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.notification_id == notification_id && owned_by(row, recipient_id, for_admin));
        Ok(match row {
            None => MarkReadOutcome::NotFound,
            Some(row) if row.is_read => MarkReadOutcome::AlreadyRead,
            Some(row) => {
                row.is_read = true;
                MarkReadOutcome::Updated
            }
        })
    }

    async fn delete(&self, recipient_id: &str, for_admin: bool, notification_id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !(row.notification_id == notification_id && owned_by(row, recipient_id, for_admin)));
        Ok(rows.len() != before)
    }

    async fn mark_all_read(&self, recipient_id: &str, for_admin: bool) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let mut changed = 0;
        for row in rows
            .iter_mut()
            .filter(|row| owned_by(row, recipient_id, for_admin) && !row.is_read)
        {
            row.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn clear_all(&self, recipient_id: &str, for_admin: bool) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !owned_by(row, recipient_id, for_admin));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_row(recipient: &str, title: &str) -> NewNotification {
        NewNotification {
            recipient_id: recipient.into(),
            title: title.into(),
            body: "body".into(),
            link: None,
            kind: "generic".into(),
            event: None,
            for_admin: false,
            raw_payload: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_scoped() {
        let store = InMemoryNotificationStore::new();
        store.insert(new_row("u1", "first")).await.unwrap();
        store.insert(new_row("u2", "other")).await.unwrap();
        store.insert(new_row("u1", "second")).await.unwrap();

        let titles: Vec<String> = store.list("u1", false).await.unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_mark_read_outcomes() {
        let store = InMemoryNotificationStore::new();
        let row = store.insert(new_row("u1", "t")).await.unwrap();

        assert_eq!(store.mark_read("u1", false, row.notification_id).await.unwrap(), MarkReadOutcome::Updated);
        assert_eq!(store.mark_read("u1", false, row.notification_id).await.unwrap(), MarkReadOutcome::AlreadyRead);
        assert_eq!(store.mark_read("u2", false, row.notification_id).await.unwrap(), MarkReadOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_delete_only_own_rows() {
        let store = InMemoryNotificationStore::new();
        let row = store.insert(new_row("u1", "t")).await.unwrap();
        assert!(!store.delete("u2", false, row.notification_id).await.unwrap());
        assert!(store.delete("u1", false, row.notification_id).await.unwrap());
        assert!(!store.delete("u1", false, row.notification_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_bulk_operations() {
        let store = InMemoryNotificationStore::new();
        for title in ["a", "b", "c"] {
            store.insert(new_row("u1", title)).await.unwrap();
        }
        store.insert(new_row("u2", "x")).await.unwrap();

        assert_eq!(store.mark_all_read("u1", false).await.unwrap(), 3);
        assert_eq!(store.mark_all_read("u1", false).await.unwrap(), 0);
        assert_eq!(store.clear_all("u1", false).await.unwrap(), 3);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_admin_rows_are_separate_from_user_named_admin() {
        let store = InMemoryNotificationStore::new();
        let admin_row = store
            .insert(NewNotification {
                for_admin: true,
                ..new_row("admin", "back office")
            })
            .await
            .unwrap();
        let user_row = store.insert(new_row("admin", "personal")).await.unwrap();

        let admin_titles: Vec<String> = store.list("admin", true).await.unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(admin_titles, vec!["back office"]);
        let user_titles: Vec<String> = store.list("admin", false).await.unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(user_titles, vec!["personal"]);

        assert_eq!(
            store.mark_read("admin", false, admin_row.notification_id).await.unwrap(),
            MarkReadOutcome::NotFound
        );
        assert!(!store.delete("admin", false, admin_row.notification_id).await.unwrap());
        assert!(!store.delete("admin", true, user_row.notification_id).await.unwrap());
        assert_eq!(store.mark_all_read("admin", false).await.unwrap(), 1);
        assert_eq!(store.clear_all("admin", false).await.unwrap(), 1);

        let remaining = store.list("admin", true).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].is_read);
    }
}
