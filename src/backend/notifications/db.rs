//! PostgreSQL collaborators
//!
//! This module contains the database-backed implementations of
//! [`NotificationStore`] and [`RecipientDirectory`]. The schema lives in
//! `migrations/`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::backend::notifications::directory::{RecipientDirectory, RecipientProfile};
use crate::backend::notifications::store::{MarkReadOutcome, NotificationStore};
use crate::shared::notification::{NewNotification, NotificationRow};

const ROW_COLUMNS: &str =
    "id, recipient_id, title, body, link, type, event, for_admin, raw_payload, is_read, created_at";

fn row_to_notification(row: PgRow) -> NotificationRow {
    NotificationRow {
        notification_id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        title: row.get("title"),
        body: row.get("body"),
        link: row.get("link"),
        kind: row.get("type"),
        event: row.get("event"),
        for_admin: row.get("for_admin"),
        raw_payload: row.get("raw_payload"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}

/// Canonical rows in the `notifications` table
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, notification: NewNotification) -> Result<NotificationRow, StoreError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, title, body, link, type, event, for_admin, raw_payload, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, $10)
            "#,
        )
        .bind(id)
        .bind(&notification.recipient_id)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.link)
        .bind(&notification.kind)
        .bind(&notification.event)
        .bind(notification.for_admin)
        .bind(sqlx::types::Json(&notification.raw_payload))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(NotificationRow {
            notification_id: id,
            recipient_id: notification.recipient_id,
            title: notification.title,
            body: notification.body,
            link: notification.link,
            kind: notification.kind,
            event: notification.event,
            for_admin: notification.for_admin,
            raw_payload: notification.raw_payload,
            is_read: false,
            created_at: now,
        })
    }

    async fn list(&self, recipient_id: &str, for_admin: bool) -> Result<Vec<NotificationRow>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notifications WHERE recipient_id = $1 AND for_admin = $2 ORDER BY created_at DESC, id DESC",
            ROW_COLUMNS
        ))
        .bind(recipient_id)
        .bind(for_admin)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_notification).collect())
    }

    async fn mark_read(
        &self,
        recipient_id: &str,
        for_admin: bool,
        notification_id: Uuid,
    ) -> Result<MarkReadOutcome, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE \
             WHERE id = $1 AND recipient_id = $2 AND for_admin = $3 AND is_read = FALSE",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .bind(for_admin)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            return Ok(MarkReadOutcome::Updated);
        }

        let exists =
            sqlx::query("SELECT 1 FROM notifications WHERE id = $1 AND recipient_id = $2 AND for_admin = $3")
                .bind(notification_id)
                .bind(recipient_id)
                .bind(for_admin)
                .fetch_optional(&self.pool)
                .await?;
        Ok(match exists {
            Some(_) => MarkReadOutcome::AlreadyRead,
            None => MarkReadOutcome::NotFound,
        })
    }

    async fn delete(&self, recipient_id: &str, for_admin: bool, notification_id: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2 AND for_admin = $3")
                .bind(notification_id)
                .bind(recipient_id)
                .bind(for_admin)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: &str, for_admin: bool) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE \
             WHERE recipient_id = $1 AND for_admin = $2 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .bind(for_admin)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn clear_all(&self, recipient_id: &str, for_admin: bool) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1 AND for_admin = $2")
            .bind(recipient_id)
            .bind(for_admin)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Profiles in the `users` table
#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for PgDirectory {
    async fn profile(&self, recipient_id: &str) -> Result<Option<RecipientProfile>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, email_notifications, locale
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| RecipientProfile {
            id: r.get("id"),
            email: r.get("email"),
            email_notifications: r.get("email_notifications"),
            locale: r.get("locale"),
        }))
    }
}
