/**
 * Notification Dispatcher
 *
 * The full create → persist → push → email pipeline for one notification to
 * one audience, plus the recipient-side list operations.
 *
 * # Dispatch steps
 *
 * 1. Merge recipient identity fields with the event payload
 * 2. Render the canonical English record
 * 3. Persist one row (a failure here aborts the dispatch)
 * 4. Resolve the live targets: the recipient's connections, or every admin
 *    connection for the admin inbox
 * 5. Push `notification_received`: canonical fields to admins, a rendering
 *    in each connection's own locale to users. No connection, no push.
 * 6. Hand an independently localized email to the secondary channel in a
 *    tracked background task (logged and swallowed on failure)
 * 7. Nudge every live connection of the recipient to re-pull the list
 *
 * Steps 1-5 and 7 run before `dispatch` returns, so pushes to one recipient
 * leave in dispatch order. Step 6 has no ordering guarantee.
 *
 * # Read path
 *
 * `fetch_list` re-localizes user rows at read time from the stored
 * `raw_payload`, never from a cached rendering. Admin rows are listed with
 * their canonical fields.
 */

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::backend::error::{BackendError, StoreError};
use crate::backend::notifications::directory::RecipientDirectory;
use crate::backend::notifications::mailer::{absolute_link, body_to_html, OutboundEmail, SecondaryChannel};
use crate::backend::notifications::store::{MarkReadOutcome, NotificationStore};
use crate::backend::notifications::templates::{merge_identity_and_payload, LocaleCatalog};
use crate::backend::realtime::hub::LiveHub;
use crate::shared::event::ServerEvent;
use crate::shared::identity::{ConnectionIdentity, Role};
use crate::shared::locale::Locale;
use crate::shared::notification::{
    Audience, NewNotification, NotificationList, NotificationRow, NotificationView, RenderedNotification,
    TemplateKey, ADMIN_INBOX,
};
use crate::shared::SharedError;

/// Identity of the person a notification is about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientIdentity {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

impl RecipientIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Identity fields exposed to templates
    pub fn template_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("user_id".into(), self.user_id.clone().into());
        if let Some(name) = &self.display_name {
            fields.insert("display_name".into(), name.clone().into());
            fields.insert("username".into(), name.clone().into());
        }
        if let Some(email) = &self.email {
            fields.insert("email".into(), email.clone().into());
        }
        if let Some(locale) = &self.locale {
            fields.insert("locale".into(), locale.clone().into());
        }
        fields
    }
}

impl From<&ConnectionIdentity> for RecipientIdentity {
    fn from(identity: &ConnectionIdentity) -> Self {
        Self {
            user_id: identity.identity_key.clone(),
            display_name: Some(identity.display_name.clone()),
            email: None,
            locale: Some(identity.locale.code().to_string()),
        }
    }
}

/// One dispatch call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub audience: Audience,
    /// Wire kind, e.g. `subscription`; unknown kinds render generically
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub event: Option<String>,
    pub identity: RecipientIdentity,
    #[serde(default)]
    pub payload: Value,
}

/// Whose notification list an operation addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbox {
    pub recipient_id: String,
    pub for_admin: bool,
}

impl Inbox {
    pub fn user(recipient_id: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            for_admin: false,
        }
    }

    pub fn admin() -> Self {
        Self {
            recipient_id: ADMIN_INBOX.to_string(),
            for_admin: true,
        }
    }

    /// Admins work the shared admin inbox; everyone else their own
    pub fn for_identity(identity_key: &str, role: Role) -> Self {
        if role.is_admin() {
            Self::admin()
        } else {
            Self::user(identity_key)
        }
    }
}

/// Dispatcher tunables
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub default_locale: Locale,
    /// Bound on one secondary-channel send
    pub email_timeout: Duration,
    /// Prefix for relative links in emails
    pub public_base_url: Option<String>,
    /// Contact address of the admin inbox
    pub admin_email: Option<String>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            default_locale: Locale::En,
            email_timeout: Duration::from_secs(10),
            public_base_url: None,
            admin_email: None,
        }
    }
}

struct EmailJob {
    row: NotificationRow,
    key: TemplateKey,
    canonical: RenderedNotification,
}

/// Notification pipeline
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    directory: Arc<dyn RecipientDirectory>,
    channel: Arc<dyn SecondaryChannel>,
    catalog: Arc<LocaleCatalog>,
    hub: LiveHub,
    settings: Arc<DispatcherSettings>,
    deliveries: Arc<Mutex<JoinSet<()>>>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        directory: Arc<dyn RecipientDirectory>,
        channel: Arc<dyn SecondaryChannel>,
        catalog: Arc<LocaleCatalog>,
        hub: LiveHub,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            store,
            directory,
            channel,
            catalog,
            hub,
            settings: Arc::new(settings),
            deliveries: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    pub fn hub(&self) -> &LiveHub {
        &self.hub
    }

    /// Create, persist and deliver one notification
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<NotificationRow, BackendError> {
        let inbox = match request.audience {
            Audience::Admin => Inbox::admin(),
            Audience::User => {
                if request.identity.user_id.trim().is_empty() {
                    return Err(SharedError::validation("identity.user_id", "Recipient id cannot be empty").into());
                }
                if request.identity.user_id.trim() == ADMIN_INBOX {
                    return Err(SharedError::validation(
                        "identity.user_id",
                        "Recipient id is reserved for the admin inbox",
                    )
                    .into());
                }
                Inbox::user(request.identity.user_id.clone())
            }
        };

        let merged = merge_identity_and_payload(request.identity.template_fields(), &request.payload);
        let key = TemplateKey::from_wire(&request.kind, request.event.as_deref());
        let canonical = self.catalog.render_canonical(key, &merged);

        let row = self
            .store
            .insert(NewNotification {
                recipient_id: inbox.recipient_id.clone(),
                title: canonical.title.clone(),
                body: canonical.body.clone(),
                link: canonical.link.clone(),
                kind: request.kind.clone(),
                event: request.event.clone(),
                for_admin: inbox.for_admin,
                raw_payload: merged.clone(),
            })
            .await
            .map_err(|e| {
                tracing::error!("[Dispatch] Failed to persist {} for {}: {}", key, inbox.recipient_id, e);
                BackendError::from(e)
            })?;

        let pushed = if inbox.for_admin {
            self.hub
                .send_to_admins(&ServerEvent::NotificationReceived(NotificationView::canonical(&row)))
        } else {
            self.hub.send_rendered(&inbox.recipient_id, |connection| {
                let localized = self
                    .catalog
                    .render_localized(connection.locale, key, &canonical, &merged);
                ServerEvent::NotificationReceived(NotificationView::from_row(&row, localized))
            })
        };
        tracing::info!(
            "[Dispatch] {} -> {} stored as {}, pushed to {} connections",
            key,
            inbox.recipient_id,
            row.notification_id,
            pushed
        );

        if self.channel.is_enabled() {
            self.spawn_email(EmailJob {
                row: row.clone(),
                key,
                canonical,
            })
            .await;
        }

        self.nudge(&inbox);
        Ok(row)
    }

    /// Dispatch to the admin inbox and to the user, independently
    ///
    /// The admin row is kept even if the user dispatch fails; that failure is
    /// still returned to the caller.
    pub async fn dispatch_both(&self, request: DispatchRequest) -> Result<Vec<NotificationRow>, BackendError> {
        let admin = self
            .dispatch(DispatchRequest {
                audience: Audience::Admin,
                ..request.clone()
            })
            .await?;
        match self
            .dispatch(DispatchRequest {
                audience: Audience::User,
                ..request
            })
            .await
        {
            Ok(user) => Ok(vec![admin, user]),
            Err(e) => {
                tracing::warn!(
                    "[Dispatch] Partially delivered: admin row {} kept, user dispatch failed: {}",
                    admin.notification_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// Authoritative list for an inbox, rendered for `locale`
    pub async fn fetch_list(&self, inbox: &Inbox, locale: Locale) -> Result<NotificationList, BackendError> {
        let rows = self.store.list(&inbox.recipient_id, inbox.for_admin).await?;
        let items = rows.iter().map(|row| self.view_for(row, locale)).collect();
        Ok(NotificationList::new(items))
    }

    /// Client view of a stored row
    pub fn view_for(&self, row: &NotificationRow, locale: Locale) -> NotificationView {
        if row.for_admin {
            return NotificationView::canonical(row);
        }
        let key = TemplateKey::from_wire(&row.kind, row.event.as_deref());
        let canonical = RenderedNotification {
            title: row.title.clone(),
            body: row.body.clone(),
            link: row.link.clone(),
        };
        let localized = self
            .catalog
            .render_localized(locale, key, &canonical, &row.raw_payload);
        NotificationView::from_row(row, localized)
    }

    /// Mark one row read; nudges only when something changed
    pub async fn mark_read(&self, inbox: &Inbox, notification_id: Uuid) -> Result<MarkReadOutcome, BackendError> {
        let outcome = self
            .store
            .mark_read(&inbox.recipient_id, inbox.for_admin, notification_id)
            .await?;
        match outcome {
            MarkReadOutcome::Updated => {
                self.nudge(inbox);
            }
            MarkReadOutcome::AlreadyRead => {}
            MarkReadOutcome::NotFound => {
                tracing::warn!(
                    "[Dispatch] {} tried to mark unknown notification {}",
                    inbox.recipient_id,
                    notification_id
                );
                return Err(BackendError::not_found("notification"));
            }
        }
        Ok(outcome)
    }

    pub async fn delete(&self, inbox: &Inbox, notification_id: Uuid) -> Result<(), BackendError> {
        if !self.store.delete(&inbox.recipient_id, inbox.for_admin, notification_id).await? {
            tracing::warn!(
                "[Dispatch] {} tried to delete unknown notification {}",
                inbox.recipient_id,
                notification_id
            );
            return Err(BackendError::not_found("notification"));
        }
        self.nudge(inbox);
        Ok(())
    }

    pub async fn mark_all_read(&self, inbox: &Inbox) -> Result<u64, BackendError> {
        let changed = self.store.mark_all_read(&inbox.recipient_id, inbox.for_admin).await?;
        if changed > 0 {
            self.nudge(inbox);
        }
        Ok(changed)
    }

    pub async fn clear_all(&self, inbox: &Inbox) -> Result<u64, BackendError> {
        let removed = self.store.clear_all(&inbox.recipient_id, inbox.for_admin).await?;
        if removed > 0 {
            self.nudge(inbox);
        }
        Ok(removed)
    }

    /// Ask every live connection of the inbox to re-pull its list
    pub fn nudge(&self, inbox: &Inbox) -> usize {
        let event = ServerEvent::NotificationsListRefresh {
            recipient_id: inbox.recipient_id.clone(),
        };
        if inbox.for_admin {
            self.hub.send_to_admins(&event)
        } else {
            self.hub.send_to_identity(&inbox.recipient_id, &event)
        }
    }

    /// Wait for every background email delivery started so far
    pub async fn drain_deliveries(&self) {
        let mut pending = std::mem::take(&mut *self.deliveries.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!("[Dispatch] Email task ended abnormally: {}", e);
            }
        }
    }

    async fn spawn_email(&self, job: EmailJob) {
        let dispatcher = self.clone();
        let mut deliveries = self.deliveries.lock().await;
        while deliveries.try_join_next().is_some() {}
        deliveries.spawn(async move { dispatcher.deliver_email(job).await });
    }

    async fn deliver_email(&self, job: EmailJob) {
        let notification_id = job.row.notification_id;
        let email = match self.compose_email(&job).await {
            Ok(Some(email)) => email,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("[Dispatch] Could not look up email recipient for {}: {}", notification_id, e);
                return;
            }
        };

        let to = email.to.clone();
        match tokio::time::timeout(self.settings.email_timeout, self.channel.send(email)).await {
            Ok(Ok(())) => tracing::info!("[Dispatch] Emailed {} to {}", notification_id, to),
            Ok(Err(e)) => tracing::warn!("[Dispatch] Email for {} to {} failed: {}", notification_id, to, e),
            Err(_) => tracing::warn!(
                "[Dispatch] Email for {} to {} timed out after {:?}",
                notification_id,
                to,
                self.settings.email_timeout
            ),
        }
    }

    /// Render the email copy, or `None` when the recipient has not opted in
    async fn compose_email(&self, job: &EmailJob) -> Result<Option<OutboundEmail>, StoreError> {
        let (to, locale) = if job.row.for_admin {
            match &self.settings.admin_email {
                Some(address) => (address.clone(), Locale::En),
                None => return Ok(None),
            }
        } else {
            let Some(profile) = self.directory.profile(&job.row.recipient_id).await? else {
                return Ok(None);
            };
            let Some(address) = profile.email.filter(|_| profile.email_notifications) else {
                return Ok(None);
            };
            let locale = profile
                .locale
                .as_deref()
                .and_then(Locale::parse)
                .or_else(|| self.hub.live_locale(&job.row.recipient_id))
                .unwrap_or(self.settings.default_locale);
            (address, locale)
        };

        let rendered = self
            .catalog
            .render_localized(locale, job.key, &job.canonical, &job.row.raw_payload);

        let mut body_html = body_to_html(&rendered.body);
        if let Some(link) = &rendered.link {
            let url = absolute_link(link, self.settings.public_base_url.as_deref());
            let url = body_to_html(&url);
            body_html.push_str(&format!("<br><br><a href=\"{}\">{}</a>", url, url));
        }

        Ok(Some(OutboundEmail {
            to,
            subject: rendered.title.clone(),
            title: rendered.title,
            body_html,
        }))
    }
}
