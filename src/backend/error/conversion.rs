/**
 * Error Conversion
 *
 * This module provides conversion implementations for backend errors,
 * allowing them to be returned directly from HTTP handlers.
 *
 * # Response Format
 *
 * Error responses are returned as JSON with the following structure:
 * ```json
 * {
 *   "error": "couldn't complete that action",
 *   "code": "not_found",
 *   "status": 404
 * }
 * ```
 *
 * Plain `IntoResponse` does not know who the caller is, so it always uses the
 * generic message. Handlers that know the caller is an admin wrap the error
 * in [`CallerError`] to expose the detailed message.
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

/// A backend error paired with the caller's admin flag
#[derive(Debug)]
pub struct CallerError {
    pub error: BackendError,
    pub is_admin: bool,
}

impl CallerError {
    pub fn new(error: impl Into<BackendError>, is_admin: bool) -> Self {
        Self {
            error: error.into(),
            is_admin,
        }
    }
}

fn error_response(error: &BackendError, is_admin: bool) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!("[Http] {} ({})", error.message(), status);
    } else {
        tracing::warn!("[Http] {} ({})", error.message(), status);
    }

    let body = serde_json::json!({
        "error": error.client_message(is_admin),
        "code": error.code(),
        "status": status.as_u16(),
    });
    (status, Json(body)).into_response()
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        error_response(&self, false)
    }
}

impl IntoResponse for CallerError {
    fn into_response(self) -> Response {
        error_response(&self.error, self.is_admin)
    }
}

impl From<BackendError> for StatusCode {
    fn from(error: BackendError) -> Self {
        error.status_code()
    }
}
