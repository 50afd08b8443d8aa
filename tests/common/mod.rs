//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - An assembled application state with in-memory collaborators
//! - Live connection helpers
//! - Custom assertion macros

pub mod assertions;
pub mod fixtures;
pub mod live;

// Re-export commonly used utilities
pub use fixtures::*;
pub use live::*;
