/**
 * API Route Handlers
 *
 * This module defines the notification REST routes.
 *
 * # Routes
 *
 * - `GET /api/notifications` - The caller's list, localized
 * - `DELETE /api/notifications` - Delete every row of the caller
 * - `POST /api/notifications/read-all` - Mark every row read
 * - `POST /api/notifications/{id}/read` - Mark one row read
 * - `DELETE /api/notifications/{id}` - Delete one row
 * - `POST /api/notifications/dispatch` - Create a notification (admin only)
 *
 * # Authentication
 *
 * Every route requires a bearer token; admins operate on the shared admin
 * inbox.
 */

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::backend::middleware::auth_middleware;
use crate::backend::notifications::handlers::{
    clear_notifications, delete_notification, dispatch_notification, list_notifications,
    mark_all_notifications_read, mark_notification_read,
};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
/// * `app_state` - State handed to the auth middleware
pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    let notifications = Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).delete(clear_notifications),
        )
        .route("/api/notifications/read-all", post(mark_all_notifications_read))
        .route("/api/notifications/dispatch", post(dispatch_notification))
        .route("/api/notifications/{id}/read", post(mark_notification_read))
        .route("/api/notifications/{id}", delete(delete_notification))
        .route_layer(middleware::from_fn_with_state(app_state, auth_middleware));

    router.merge(notifications)
}
