//! Notification HTTP Handlers
//!
//! REST counterparts of the socket notification events, plus the dispatch
//! entry point the rest of the portal calls. All routes sit behind
//! [`auth_middleware`](crate::backend::middleware::auth_middleware); dispatch
//! additionally requires the admin role.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::backend::error::{BackendError, CallerError};
use crate::backend::middleware::AuthUser;
use crate::backend::notifications::dispatcher::{DispatchRequest, NotificationDispatcher, RecipientIdentity};
use crate::backend::notifications::store::MarkReadOutcome;
use crate::shared::locale::Locale;
use crate::shared::notification::{Audience, NotificationList};

/// Optional locale override for list rendering
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkReadResponse {
    /// `false` when the row was already read
    pub updated: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkResponse {
    pub changed: u64,
}

/// Audience accepted by the dispatch route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchAudience {
    User,
    Admin,
    Both,
}

#[derive(Debug, Deserialize)]
pub struct DispatchBody {
    pub audience: DispatchAudience,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub event: Option<String>,
    pub identity: RecipientIdentity,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchResponse {
    pub notification_ids: Vec<Uuid>,
}

/// `GET /api/notifications`
pub async fn list_notifications(
    State(dispatcher): State<NotificationDispatcher>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<NotificationList>, CallerError> {
    let locale = query
        .locale
        .as_deref()
        .map(|candidate| Locale::normalize(Some(candidate), user.locale))
        .unwrap_or(user.locale);
    let list = dispatcher
        .fetch_list(&user.inbox(), locale)
        .await
        .map_err(|e| CallerError::new(e, user.is_admin()))?;
    Ok(Json(list))
}

/// `POST /api/notifications/{id}/read`
pub async fn mark_notification_read(
    State(dispatcher): State<NotificationDispatcher>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>, CallerError> {
    let outcome = dispatcher
        .mark_read(&user.inbox(), notification_id)
        .await
        .map_err(|e| CallerError::new(e, user.is_admin()))?;
    Ok(Json(MarkReadResponse {
        updated: outcome == MarkReadOutcome::Updated,
    }))
}

/// `DELETE /api/notifications/{id}`
pub async fn delete_notification(
    State(dispatcher): State<NotificationDispatcher>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, CallerError> {
    dispatcher
        .delete(&user.inbox(), notification_id)
        .await
        .map_err(|e| CallerError::new(e, user.is_admin()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_notifications_read(
    State(dispatcher): State<NotificationDispatcher>,
    AuthUser(user): AuthUser,
) -> Result<Json<BulkResponse>, CallerError> {
    let changed = dispatcher
        .mark_all_read(&user.inbox())
        .await
        .map_err(|e| CallerError::new(e, user.is_admin()))?;
    Ok(Json(BulkResponse { changed }))
}

/// `DELETE /api/notifications`
pub async fn clear_notifications(
    State(dispatcher): State<NotificationDispatcher>,
    AuthUser(user): AuthUser,
) -> Result<Json<BulkResponse>, CallerError> {
    let changed = dispatcher
        .clear_all(&user.inbox())
        .await
        .map_err(|e| CallerError::new(e, user.is_admin()))?;
    Ok(Json(BulkResponse { changed }))
}

/// `POST /api/notifications/dispatch`
///
/// Called by the rest of the portal when something notification-worthy
/// happens (a plan is activated, a payment arrives, ...). Admin only.
pub async fn dispatch_notification(
    State(dispatcher): State<NotificationDispatcher>,
    AuthUser(user): AuthUser,
    Json(body): Json<DispatchBody>,
) -> Result<(StatusCode, Json<DispatchResponse>), CallerError> {
    if !user.is_admin() {
        tracing::warn!("[Dispatch] Non-admin {} tried to dispatch {}", user.identity_key, body.kind);
        return Err(CallerError::new(
            BackendError::unauthorized("dispatch requires the admin role"),
            false,
        ));
    }

    let request = DispatchRequest {
        audience: Audience::User,
        kind: body.kind,
        event: body.event,
        identity: body.identity,
        payload: body.payload,
    };

    let rows = match body.audience {
        DispatchAudience::User => vec![dispatcher.dispatch(request).await],
        DispatchAudience::Admin => vec![
            dispatcher
                .dispatch(DispatchRequest {
                    audience: Audience::Admin,
                    ..request
                })
                .await,
        ],
        DispatchAudience::Both => match dispatcher.dispatch_both(request).await {
            Ok(rows) => rows.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        },
    }
    .into_iter()
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| CallerError::new(e, true))?;

    Ok((
        StatusCode::CREATED,
        Json(DispatchResponse {
            notification_ids: rows.into_iter().map(|row| row.notification_id).collect(),
        }),
    ))
}
