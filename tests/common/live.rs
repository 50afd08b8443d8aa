//! Live connection helpers
//!
//! Connections are registered straight on the hub with an in-process outbox,
//! so tests observe exactly what a socket writer would send.

use portal_realtime::backend::realtime::{outbox, LiveHub, OutboxReceiver};
use portal_realtime::shared::{ConnectionIdentity, Locale, Role, ServerEvent};

/// One fake tab
pub struct TestConnection {
    pub identity: ConnectionIdentity,
    pub rx: OutboxReceiver,
}

impl TestConnection {
    /// Everything queued for this connection so far
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn id(&self) -> uuid::Uuid {
        self.identity.connection_id
    }
}

pub fn connect(hub: &LiveHub, key: &str, role: Role, locale: Locale) -> TestConnection {
    let identity = ConnectionIdentity::new(key, role, key, locale);
    let (tx, rx) = outbox();
    hub.connect(identity.clone(), tx);
    TestConnection { identity, rx }
}
