//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//! These errors are used in socket and HTTP handlers and can be converted to
//! HTTP responses or `error` socket events.
//!
//! # Architecture
//!
//! - **`types`** - Error type definitions and constructors
//! - **`conversion`** - Error conversion implementations (IntoResponse, etc.)
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # Error Types
//!
//! - `BackendError` - Handler, validation, not-found, unauthorized, store,
//!   configuration and serialization failures
//! - `StoreError` - Data-store collaborator failures
//! - `ConfigError` - Fatal startup configuration failures
//!
//! Non-admin callers never see raw store or transport details; see
//! [`BackendError::client_message`].

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use conversion::CallerError;
pub use types::{BackendError, ConfigError, StoreError, GENERIC_FAILURE_MESSAGE};
