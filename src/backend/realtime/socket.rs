/**
 * WebSocket Endpoint
 *
 * `GET /ws` upgrades to a WebSocket carrying JSON text frames shaped
 * `{"event": "<name>", "data": {...}}` in both directions.
 *
 * # Connection lifecycle
 *
 * 1. The handshake establishes identity, role and locale (bearer token,
 *    else guest cookie, else a freshly minted guest key sent back in
 *    `Set-Cookie` on the upgrade response)
 * 2. The connection is registered with the hub together with its outbox
 * 3. A writer task drains the outbox onto the socket
 * 4. The reader loop runs each inbound frame to completion, in order
 * 5. When either side stops, the hub tears the connection down: every room
 *    is left and presence is updated
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::backend::auth::{HandshakeOutcome, HandshakeQuery};
use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::outbox;
use crate::backend::realtime::handler::EventHandler;
use crate::backend::server::state::AppState;
use crate::shared::identity::ConnectionIdentity;
use crate::shared::SharedError;

/// Handle the socket upgrade (GET /ws)
///
/// # Query Parameters
///
/// - `token` - Bearer token, for clients that cannot set headers
/// - `locale` - Preferred locale hint
pub async fn handle_socket_upgrade(
    State(app_state): State<AppState>,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let HandshakeOutcome { identity, set_cookie } = app_state.handshake.identify(&headers, &query);
    let events = app_state.events.clone();

    let mut response = ws.on_upgrade(move |socket| run_connection(socket, events, identity));
    if let Some(cookie) = set_cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("[Socket] Could not encode guest cookie: {}", e),
        }
    }
    response
}

/// Drive one accepted connection until it closes
pub async fn run_connection(socket: WebSocket, events: EventHandler, identity: ConnectionIdentity) {
    let connection_id = identity.connection_id;
    let identity_key = identity.identity_key.clone();
    let (tx, mut rx) = outbox();
    events.hub().connect(identity, tx);

    let (mut sender, mut incoming) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("[Socket] Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let reader_events = events.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(message) = incoming.next().await {
            match message {
                Ok(Message::Text(text)) => reader_events.handle_frame(connection_id, text.as_str()).await,
                Ok(Message::Binary(_)) => {
                    let error = BackendError::from(SharedError::protocol("binary frames are not supported"));
                    reader_events.report(connection_id, &error);
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("[Socket] Read error on {}: {}", connection_id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    let report = events.hub().disconnect(connection_id);
    tracing::debug!(
        "[Socket] {} closed: {} room updates, offline: {}",
        identity_key,
        report.room_broadcasts,
        report.went_offline
    );
}
