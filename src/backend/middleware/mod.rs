//! Middleware Module
//!
//! This module contains all HTTP middleware for the backend server.
//! Middleware functions are used to process requests before they reach
//! handlers.
//!
//! # Architecture
//!
//! The middleware module currently provides:
//!
//! - **`auth`** - Bearer-token authentication for the notification REST routes

pub mod auth;

pub use auth::{AuthenticatedUser, AuthUser, auth_middleware, authenticate, extract_authenticated_user};
