//! Backend Module
//!
//! This module contains all server-side code: the WebSocket hub that tracks
//! who is online and which rooms they are in, and the notification pipeline
//! that persists, localizes and delivers notifications.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Connection registry, live hub, socket endpoint
//! - **`presence`** - Who is online, one entry per identity
//! - **`rooms`** - Private, public and lobby membership lists
//! - **`locale`** - Locale resolution for connections and requests
//! - **`notifications`** - Templates, persistence, dispatch, email
//! - **`auth`** - Session tokens and the connection handshake
//! - **`middleware`** - Request processing middleware
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── realtime/       - Live transport
//! ├── presence/       - Presence store
//! ├── rooms/          - Room membership
//! ├── locale/         - Locale resolver
//! ├── notifications/  - Notification pipeline
//! ├── auth/           - Authentication
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Concurrency
//!
//! Presence, room membership and the connection registry are owned by one
//! [`LiveHub`] per process and mutated inside a single critical section.
//! Running several processes needs a shared external store for them.

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Live transport
#[cfg(feature = "ssr")]
pub mod realtime;

/// Presence store
#[cfg(feature = "ssr")]
pub mod presence;

/// Room membership
#[cfg(feature = "ssr")]
pub mod rooms;

/// Locale resolution
#[cfg(feature = "ssr")]
pub mod locale;

/// Notification pipeline
#[cfg(feature = "ssr")]
pub mod notifications;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Authentication
#[cfg(feature = "ssr")]
pub mod auth;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use server::create_app;
#[cfg(feature = "ssr")]
pub use realtime::LiveHub;
#[cfg(feature = "ssr")]
pub use notifications::NotificationDispatcher;
#[cfg(feature = "ssr")]
pub use error::BackendError;
