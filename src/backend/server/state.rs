/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The live hub (connections, presence, rooms)
 * - The notification dispatcher and its collaborators
 * - The socket event handler
 * - The handshake (session keys, locale resolver, guest cookie)
 * - The loaded configuration
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 *
 * # Example
 *
 * ```rust,no_run
 * use portal_realtime::backend::notifications::NotificationDispatcher;
 * use axum::extract::State;
 *
 * async fn handler(State(dispatcher): State<NotificationDispatcher>) {
 *     let _ = dispatcher.hub().connection_count();
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::Handshake;
use crate::backend::notifications::NotificationDispatcher;
use crate::backend::realtime::{EventHandler, LiveHub};
use crate::backend::server::config::ServerConfig;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Live state of this process
    pub hub: LiveHub,

    /// Notification pipeline; shares `hub`
    pub dispatcher: NotificationDispatcher,

    /// Inbound socket event logic
    pub events: EventHandler,

    /// Connection identification
    pub handshake: Arc<Handshake>,

    pub config: Arc<ServerConfig>,
}

impl FromRef<AppState> for LiveHub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for NotificationDispatcher {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.dispatcher.clone()
    }
}

impl FromRef<AppState> for EventHandler {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.events.clone()
    }
}

impl FromRef<AppState> for Arc<Handshake> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.handshake.clone()
    }
}
