/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in socket and HTTP handlers and can be converted to
 * HTTP responses or `error` socket events.
 *
 * # Error Types
 *
 * - `BackendError` - Anything a handler can fail with
 * - `StoreError` - Data-store collaborator failures
 * - `ConfigError` - Startup configuration failures (always fatal)
 *
 * # Error Categories
 *
 * ## Validation
 *
 * Malformed room ids, empty message bodies, unknown frames. Rejected at the
 * handler boundary and never reach persistence.
 *
 * ## Not found / unauthorized
 *
 * Operating on a row or room the caller does not own. Denied without any
 * state change.
 *
 * ## Persistence
 *
 * The data store was unavailable. Surfaced to the caller; persistence is a
 * single atomic call so no partial row is left behind.
 *
 * # Client-facing messages
 *
 * Non-admin callers only ever see [`GENERIC_FAILURE_MESSAGE`]. Admins get the
 * detailed message, which may include store details.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::event::ServerEvent;
use crate::shared::SharedError;

/// What non-admin callers are told whenever anything goes wrong
pub const GENERIC_FAILURE_MESSAGE: &str = "couldn't complete that action";

/// Data-store collaborator errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query or connection failure reported by the database driver
    #[cfg(feature = "ssr")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be reached or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A supported locale has no dictionary file
    #[error("Missing locale dictionary for '{locale}' at {path}")]
    MissingDictionary { locale: String, path: String },

    /// A dictionary file exists but is not a valid dictionary
    #[error("Invalid locale dictionary {path}: {message}")]
    InvalidDictionary { path: String, message: String },

    /// A configuration value could not be parsed
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Backend-specific error types
///
/// This enum represents all possible errors that can occur in the backend.
/// Each variant can be converted to an HTTP response or a socket event.
///
/// # Usage
///
/// ```rust
/// use portal_realtime::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// let err = BackendError::not_found("notification");
/// let err = BackendError::unauthorized("not a member of this room");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., missing headers, invalid request)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Shared error (validation, protocol, serialization)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// The addressed row or room does not exist for this caller
    #[error("Not found: {resource}")]
    NotFound {
        /// What was looked up
        resource: String,
    },

    /// The caller may not perform this operation
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// Data-store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `SharedError` - 400, except serialization which is 500
    /// - `NotFound` - 404
    /// - `Unauthorized` - 403
    /// - `Store` - 503
    /// - `Config`, `SerializationError` - 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in `error` socket events
    pub fn code(&self) -> &'static str {
        match self {
            Self::HandlerError { .. } => "request",
            Self::SharedError(SharedError::ValidationError { .. }) => "validation",
            Self::SharedError(SharedError::ProtocolError { .. }) => "protocol",
            Self::SharedError(SharedError::SerializationError { .. }) => "serialization",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Store(_) => "store",
            Self::Config(_) | Self::SerializationError(_) => "internal",
        }
    }

    /// Get the detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::NotFound { resource } => format!("{} not found", resource),
            Self::Unauthorized { message } => message.clone(),
            Self::Store(err) => err.to_string(),
            Self::Config(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }

    /// Message safe to show to the caller
    pub fn client_message(&self, is_admin: bool) -> String {
        if is_admin {
            self.message()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }

    /// `error` socket event for the caller
    pub fn to_event(&self, is_admin: bool) -> ServerEvent {
        ServerEvent::error(self.code(), self.client_message(is_admin))
    }
}
