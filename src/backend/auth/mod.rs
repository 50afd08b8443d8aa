//! Authentication Module
//!
//! Verifies who a caller is. The portal's login and signup screens issue
//! the tokens; this module only checks them.
//!
//! # Architecture
//!
//! - **`sessions`** - JWT token generation and validation
//! - **`handshake`** - Socket handshake: token, guest cookie and locale
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── sessions.rs     - JWT token management
//! └── handshake.rs    - Connection identification
//! ```
//!
//! # Security
//!
//! - JWT tokens are used for stateless authentication
//! - Tokens expire after 30 days
//! - Guest keys are only accepted in the shape this server mints

/// JWT token generation and validation
pub mod sessions;

/// Socket handshake identification
pub mod handshake;

pub use handshake::{Handshake, HandshakeOutcome, HandshakeQuery};
pub use sessions::{Claims, SessionKeys};
