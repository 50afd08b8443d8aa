//! Presence Module
//!
//! Tracks which identities are currently connected to this server process.
//!
//! # Deployment constraint
//!
//! Presence lives in process memory. Running several server processes
//! behind a load balancer needs a shared, atomically-updated backend for this
//! store; a single process is the supported deployment.

/// Identity-keyed presence registry
pub mod store;

pub use store::PresenceStore;
