//! Portal Realtime - Main Library
//!
//! Real-time presence, room membership and localized notifications for a
//! subscription portal: customers talk to support in private rooms, browse
//! public rooms and the lobby, and receive notifications (in English or
//! Icelandic) live, in a persistent list, and optionally by email.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between the client and the backend
//!   - Socket event contract, notification records, identities, locales
//!   - Error types and client configuration
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP + WebSocket server
//!   - Presence, rooms, notification dispatch, email
//!
//! - **`client`** - Client-side state machines, no server dependencies
//!   - Guarded event gateway (queues until the transport is ready)
//!   - Notification center controller
//!
//! # Feature Flags
//!
//! - **`ssr`** - Enables the backend modules (on by default)
//!
//! # Usage
//!
//! ```rust,no_run
//! use portal_realtime::backend::server::init::create_app;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app().await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `shared::SharedError` for wire-level validation and protocol errors
//! - `backend::BackendError` for handler failures, mapped to HTTP responses
//!   and `error` socket events

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Client-side gateway and notification center
pub mod client;
