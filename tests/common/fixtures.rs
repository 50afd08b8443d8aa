//! Application fixtures
//!
//! Assembles a full `AppState` against the bundled dictionaries with the
//! in-memory store and directory and a channel that records every email.

use async_trait::async_trait;
use portal_realtime::backend::notifications::mailer::DeliveryError;
use portal_realtime::backend::notifications::{
    InMemoryDirectory, InMemoryNotificationStore, LocaleCatalog, OutboundEmail, RecipientProfile,
    SecondaryChannel,
};
use portal_realtime::backend::server::{assemble_state, AppState, ServerConfig};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Secondary channel that keeps what it was asked to send
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl SecondaryChannel for RecordingChannel {
    async fn send(&self, email: OutboundEmail) -> Result<(), DeliveryError> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}

/// Everything a test may want to poke at
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryNotificationStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub channel: Arc<RecordingChannel>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let catalog = LocaleCatalog::load_dir(locales_dir()).expect("bundled dictionaries load");
        let store = Arc::new(InMemoryNotificationStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let channel = Arc::new(RecordingChannel::default());

        let state = assemble_state(
            config,
            catalog,
            store.clone(),
            directory.clone(),
            channel.clone(),
        )
        .expect("state assembles");

        Self {
            state,
            store,
            directory,
            channel,
        }
    }

    /// Register an opted-in recipient with an email address
    pub async fn with_recipient(self, id: &str, email: &str, locale: Option<&str>) -> Self {
        self.directory
            .upsert(RecipientProfile {
                id: id.to_string(),
                email: Some(email.to_string()),
                email_notifications: true,
                locale: locale.map(str::to_string),
            })
            .await;
        self
    }

    pub async fn emails(&self) -> Vec<OutboundEmail> {
        self.state.dispatcher.drain_deliveries().await;
        self.channel.sent.lock().await.clone()
    }
}

pub fn locales_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("locales")
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        jwt_secret: Some("integration-test-secret".to_string()),
        locales_dir: locales_dir(),
        admin_email: Some("support@example.com".to_string()),
        public_base_url: Some("https://portal.example.com".to_string()),
        ..ServerConfig::default()
    }
}
