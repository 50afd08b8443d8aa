//! Client gateway and notification center integration tests
//!
//! A scripted transport stands in for the socket: it records sends, keeps
//! registered handlers, and replays server events into them.

use portal_realtime::client::{EventCallback, GatewayError, GuardedGateway, HandlerId, NotificationCenter, Transport};
use portal_realtime::shared::{ClientEvent, NotificationCenterConfig, NotificationList, ServerEvent};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ScriptedTransport {
    ready: bool,
    sent: Vec<String>,
    handlers: BTreeMap<HandlerId, (String, EventCallback)>,
    next_id: HandlerId,
}

impl ScriptedTransport {
    fn push(&mut self, event: &ServerEvent) {
        let value = serde_json::to_value(event).unwrap();
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        for (name, handler) in self.handlers.values_mut() {
            if name == event.name() {
                handler(&data);
            }
        }
    }
}

impl Transport for ScriptedTransport {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn send(&mut self, action: &str, _payload: Value) -> Result<(), GatewayError> {
        if !self.ready {
            return Err(GatewayError::NotConnected);
        }
        self.sent.push(action.to_string());
        Ok(())
    }

    fn register(&mut self, event: &str, handler: EventCallback) -> HandlerId {
        self.next_id += 1;
        self.handlers.insert(self.next_id, (event.to_string(), handler));
        self.next_id
    }

    fn unregister(&mut self, id: HandlerId) {
        self.handlers.remove(&id);
    }
}

#[test]
fn test_early_actions_flush_in_order_before_listeners() {
    let mut gateway = GuardedGateway::new(ScriptedTransport::default());
    let received = Arc::new(Mutex::new(Vec::new()));

    gateway.emit("A", Value::Null);
    let first = received.clone();
    gateway.subscribe(
        "notifications_list_refresh",
        Box::new(move |_| first.lock().unwrap().push("first")),
    );
    gateway.emit("B", Value::Null);
    let second = received.clone();
    gateway.subscribe(
        "notifications_list_refresh",
        Box::new(move |_| second.lock().unwrap().push("second")),
    );
    gateway.emit("C", Value::Null);

    assert!(gateway.transport().sent.is_empty());
    gateway.transport_mut().ready = true;
    let report = gateway.on_ready();

    assert_eq!(gateway.transport().sent, vec!["A", "B", "C"]);
    assert_eq!(report.sent, 3);
    assert_eq!(report.registered, 2);

    gateway.transport_mut().push(&ServerEvent::NotificationsListRefresh {
        recipient_id: "u1".to_string(),
    });
    assert_eq!(*received.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_component_gone_before_connect_leaves_no_handler() {
    let mut gateway = GuardedGateway::new(ScriptedTransport::default());
    let subscription = gateway.subscribe("notification_received", Box::new(|_| {}));
    gateway.unsubscribe(&subscription);

    gateway.transport_mut().ready = true;
    gateway.on_ready();
    assert!(gateway.transport().handlers.is_empty());
}

#[test]
fn test_center_drives_fetches_through_gateway() {
    let mut gateway = GuardedGateway::new(ScriptedTransport::default());
    let center = Arc::new(Mutex::new(NotificationCenter::new(NotificationCenterConfig::default())));
    let outgoing: Arc<Mutex<Vec<ClientEvent>>> = Arc::default();

    for name in ["notifications_list_refresh", "notifications_list"] {
        let center = center.clone();
        let outgoing = outgoing.clone();
        gateway.subscribe(
            name,
            Box::new(move |data| {
                let event: ServerEvent = serde_json::from_value(serde_json::json!({
                    "event": name,
                    "data": data,
                }))
                .unwrap();
                if let Some(follow_up) = center.lock().unwrap().handle_server_event(&event) {
                    outgoing.lock().unwrap().push(follow_up);
                }
            }),
        );
    }

    let initial = center.lock().unwrap().request_fetch().unwrap();
    gateway.emit_event(&initial).unwrap();
    gateway.transport_mut().ready = true;
    gateway.on_ready();
    assert_eq!(gateway.transport().sent, vec!["fetch_notifications"]);

    // Two nudges while the first pull is outstanding collapse into one
    let nudge = ServerEvent::NotificationsListRefresh {
        recipient_id: "u1".to_string(),
    };
    gateway.transport_mut().push(&nudge);
    gateway.transport_mut().push(&nudge);
    assert!(outgoing.lock().unwrap().is_empty());

    gateway
        .transport_mut()
        .push(&ServerEvent::NotificationsList(NotificationList::default()));
    assert_eq!(*outgoing.lock().unwrap(), vec![ClientEvent::FetchNotifications]);
}
