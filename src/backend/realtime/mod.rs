//! Real-time Module
//!
//! Live, room-addressable push over WebSocket.
//!
//! # Architecture
//!
//! - **`broadcast`** - Connection registry and per-connection outboxes
//! - **`hub`** - Presence, rooms and the registry behind one critical section
//! - **`handler`** - Per-event logic for inbound client events
//! - **`socket`** - The `GET /ws` upgrade and connection lifecycle
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── broadcast.rs    - Connection registry, outboxes
//! ├── hub.rs          - Live state owner
//! ├── handler.rs      - Client event handling
//! └── socket.rs       - WebSocket endpoint
//! ```

/// Connection registry and fan-out
pub mod broadcast;

/// Live state owner
pub mod hub;

/// Client event handling
pub mod handler;

/// WebSocket endpoint
pub mod socket;

pub use broadcast::{outbox, ConnectionRegistry, Outbox, OutboxReceiver};
pub use handler::EventHandler;
pub use hub::{DisconnectReport, LiveHub};
pub use socket::handle_socket_upgrade;
