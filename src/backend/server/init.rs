/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including collaborator selection, state creation and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load configuration (fatal on malformed values)
 * 2. Load the locale dictionaries (fatal if any supported locale is missing)
 * 3. Pick the data-store collaborators: PostgreSQL when `DATABASE_URL` is
 *    set and reachable, in-memory otherwise
 * 4. Pick the secondary channel: SMTP when `SMTP_HOST` is set, disabled
 *    otherwise
 * 5. Wire hub, dispatcher, handshake and event handler into `AppState`
 * 6. Create the router
 */

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use crate::backend::auth::{Handshake, SessionKeys};
use crate::backend::error::ConfigError;
use crate::backend::locale::resolver::LocaleResolver;
use crate::backend::notifications::db::{PgDirectory, PgNotificationStore};
use crate::backend::notifications::{
    DisabledChannel, InMemoryDirectory, InMemoryNotificationStore, LocaleCatalog, NotificationDispatcher,
    NotificationStore, RecipientDirectory, SecondaryChannel, SmtpMailer,
};
use crate::backend::realtime::{EventHandler, LiveHub};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application from the environment
pub async fn create_app() -> Result<Router<()>, ConfigError> {
    let config = ServerConfig::load()?;
    let app_state = build_state(config).await?;
    Ok(create_router(app_state))
}

/// Build the application state with production collaborators
pub async fn build_state(config: ServerConfig) -> Result<AppState, ConfigError> {
    tracing::info!("[Init] Initializing portal realtime server");

    let catalog = LocaleCatalog::load_dir(&config.locales_dir)?;
    tracing::info!("[Init] Locale dictionaries loaded from {}", config.locales_dir.display());

    let (store, directory): (Arc<dyn NotificationStore>, Arc<dyn RecipientDirectory>) =
        match load_database(config.database_url.as_deref()).await {
            Some(pool) => (
                Arc::new(PgNotificationStore::new(pool.clone())),
                Arc::new(PgDirectory::new(pool)),
            ),
            None => (
                Arc::new(InMemoryNotificationStore::new()),
                Arc::new(InMemoryDirectory::new()),
            ),
        };

    let channel: Arc<dyn SecondaryChannel> = match config.smtp_settings() {
        Some(settings) => Arc::new(SmtpMailer::new(&settings).map_err(|e| ConfigError::InvalidValue {
            key: "SMTP".to_string(),
            message: e.to_string(),
        })?),
        None => {
            tracing::info!("[Init] SMTP_HOST not set. Email delivery disabled.");
            Arc::new(DisabledChannel)
        }
    };

    assemble_state(config, catalog, store, directory, channel)
}

/// Wire the given collaborators into an `AppState`
///
/// Used by [`build_state`] and by tests that bring their own doubles.
pub fn assemble_state(
    config: ServerConfig,
    catalog: LocaleCatalog,
    store: Arc<dyn NotificationStore>,
    directory: Arc<dyn RecipientDirectory>,
    channel: Arc<dyn SecondaryChannel>,
) -> Result<AppState, ConfigError> {
    let default_locale = config.default_locale()?;

    let secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!("[Init] JWT_SECRET not set. Using a random secret; only guests can connect.");
            Uuid::new_v4().to_string()
        }
    };

    let hub = LiveHub::new();
    let dispatcher = NotificationDispatcher::new(
        store,
        directory,
        channel,
        Arc::new(catalog),
        hub.clone(),
        config.dispatcher_settings()?,
    );
    let handshake = Handshake::new(
        SessionKeys::new(secret),
        LocaleResolver::new(default_locale),
        config.guest_cookie.clone(),
    );
    let events = EventHandler::new(dispatcher.clone(), default_locale);

    tracing::info!("[Init] State assembled (default locale {})", default_locale);
    Ok(AppState {
        hub,
        dispatcher,
        events,
        handshake: Arc::new(handshake),
        config: Arc::new(config),
    })
}
