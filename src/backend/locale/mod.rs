//! Locale Module
//!
//! Handshake-time locale resolution. Runtime locale changes go through the
//! live hub, which acknowledges them to the requesting connection only.

/// Handshake locale resolution
pub mod resolver;

pub use resolver::{HandshakeHints, LocaleResolver};
