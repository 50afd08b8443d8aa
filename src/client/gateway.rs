//! # Guarded Event Gateway
//!
//! Wraps the live transport so callers can emit actions and subscribe to
//! events before the transport is ready. Anything issued early is queued and
//! flushed once the transport reports ready.
//!
//! ## Flush order
//!
//! 1. Queued outbound actions, in the order they were emitted
//! 2. Queued subscriptions, in the order they were made
//!
//! Outbound actions go first so user actions taken while connecting leave
//! before new listeners are installed.
//!
//! ## Cancelling early subscriptions
//!
//! Unsubscribing a subscription that is still queued marks it cancelled and
//! the flush skips it, so a view that subscribes and goes away before the
//! transport is ready never leaves a handler behind.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portal_realtime::client::gateway::{GuardedGateway, Transport};
//! # fn demo<T: Transport>(transport: T) {
//! let mut gateway = GuardedGateway::new(transport);
//! gateway.emit("fetch_notifications", serde_json::Value::Null);
//! let subscription = gateway.subscribe("notification_received", Box::new(|data| {
//!     println!("{}", data);
//! }));
//! // ... transport connects ...
//! gateway.on_ready();
//! gateway.unsubscribe(&subscription);
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::shared::event::ClientEvent;

/// Transport-assigned id of an installed handler
pub type HandlerId = u64;

/// Callback invoked with an event's `data`
pub type EventCallback = Box<dyn FnMut(&Value) + Send>;

/// Transport failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not encode event: {0}")]
    Encode(String),
}

/// The live transport the gateway guards
pub trait Transport {
    fn is_ready(&self) -> bool;

    fn send(&mut self, action: &str, payload: Value) -> Result<(), GatewayError>;

    fn register(&mut self, event: &str, handler: EventCallback) -> HandlerId;

    fn unregister(&mut self, id: HandlerId);
}

/// What happened to an emitted action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitted {
    Sent,
    Queued,
}

/// Handle returned by [`GuardedGateway::subscribe`]
#[derive(Debug, Clone)]
pub struct Subscription {
    key: u64,
    event: String,
    cancelled: Arc<AtomicBool>,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct PendingAction {
    action: String,
    payload: Value,
}

struct PendingSubscription {
    key: u64,
    event: String,
    handler: EventCallback,
    cancelled: Arc<AtomicBool>,
}

/// Counts from one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub sent: usize,
    pub registered: usize,
    pub skipped: usize,
}

/// Queueing wrapper around a [`Transport`]
pub struct GuardedGateway<T: Transport> {
    transport: T,
    pending_outbound: VecDeque<PendingAction>,
    pending_subscriptions: VecDeque<PendingSubscription>,
    installed: HashMap<u64, HandlerId>,
    next_key: u64,
}

impl<T: Transport> GuardedGateway<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            pending_outbound: VecDeque::new(),
            pending_subscriptions: VecDeque::new(),
            installed: HashMap::new(),
            next_key: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn pending_outbound(&self) -> usize {
        self.pending_outbound.len()
    }

    pub fn pending_subscriptions(&self) -> usize {
        self.pending_subscriptions.len()
    }

    /// Send now, or queue until the transport is ready
    ///
    /// Never fails: a send the transport rejects is queued for the next flush.
    pub fn emit(&mut self, action: &str, payload: Value) -> Emitted {
        if self.transport.is_ready() && self.pending_outbound.is_empty() {
            match self.transport.send(action, payload.clone()) {
                Ok(()) => return Emitted::Sent,
                Err(e) => tracing::warn!("[Gateway] Send of {} failed, queueing: {}", action, e),
            }
        }
        self.pending_outbound.push_back(PendingAction {
            action: action.to_string(),
            payload,
        });
        Emitted::Queued
    }

    /// Emit a typed client event
    pub fn emit_event(&mut self, event: &ClientEvent) -> Result<Emitted, GatewayError> {
        let mut value = serde_json::to_value(event).map_err(|e| GatewayError::Encode(e.to_string()))?;
        let action = value
            .get("event")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Encode("event name missing".to_string()))?;
        let payload = value
            .as_object_mut()
            .and_then(|object| object.remove("data"))
            .unwrap_or(Value::Null);
        Ok(self.emit(&action, payload))
    }

    /// Register now, or queue until the transport is ready
    pub fn subscribe(&mut self, event: &str, handler: EventCallback) -> Subscription {
        let key = self.next_key;
        self.next_key += 1;
        let cancelled = Arc::new(AtomicBool::new(false));

        if self.transport.is_ready() && self.pending_subscriptions.is_empty() {
            let id = self.transport.register(event, handler);
            self.installed.insert(key, id);
        } else {
            self.pending_subscriptions.push_back(PendingSubscription {
                key,
                event: event.to_string(),
                handler,
                cancelled: cancelled.clone(),
            });
        }

        Subscription {
            key,
            event: event.to_string(),
            cancelled,
        }
    }

    /// Remove an installed handler, or cancel a queued one
    pub fn unsubscribe(&mut self, subscription: &Subscription) {
        subscription.cancelled.store(true, Ordering::SeqCst);
        if let Some(id) = self.installed.remove(&subscription.key) {
            self.transport.unregister(id);
        }
    }

    /// Flush both queues; call when the transport becomes ready
    pub fn on_ready(&mut self) -> FlushReport {
        let mut report = FlushReport::default();

        while let Some(pending) = self.pending_outbound.pop_front() {
            if let Err(e) = self.transport.send(&pending.action, pending.payload.clone()) {
                tracing::warn!("[Gateway] Flush stopped at {}: {}", pending.action, e);
                self.pending_outbound.push_front(pending);
                return report;
            }
            report.sent += 1;
        }

        while let Some(pending) = self.pending_subscriptions.pop_front() {
            if pending.cancelled.load(Ordering::SeqCst) {
                report.skipped += 1;
                continue;
            }
            let id = self.transport.register(&pending.event, pending.handler);
            self.installed.insert(pending.key, id);
            report.registered += 1;
        }

        tracing::debug!(
            "[Gateway] Flushed {} actions, {} subscriptions ({} cancelled)",
            report.sent,
            report.registered,
            report.skipped
        );
        report
    }
}
