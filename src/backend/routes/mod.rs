//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation, health
//! └── api_routes.rs   - Notification REST routes
//! ```
//!
//! # Routes
//!
//! - `GET /ws` - WebSocket upgrade
//! - `GET /health` - Liveness and connection counts
//! - `/api/notifications/...` - See [`api_routes`]

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

// Re-export commonly used functions
pub use router::create_router;
