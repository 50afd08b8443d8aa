/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Live routes (WebSocket upgrade, health)
 * 2. API routes (notifications)
 * 3. Static files
 * 4. Fallback handler (404)
 */

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use crate::backend::realtime::{handle_socket_upgrade, LiveHub};
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// `GET /health`
pub async fn health(State(hub): State<LiveHub>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": hub.connection_count(),
        "online": hub.presence_snapshot().len(),
    }))
}

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state shared by all handlers
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/ws", get(handle_socket_upgrade))
        .route("/health", get(health));

    // Add API routes
    let router = configure_api_routes(router, app_state.clone());

    // Add static file serving
    let router = router.nest_service("/static", ServeDir::new("public"));

    // Fallback handler for 404
    let router = router.fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") });

    router.with_state(app_state)
}
