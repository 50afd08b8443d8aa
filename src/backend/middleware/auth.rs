/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting the notification REST
 * routes. It extracts and verifies the bearer token from the Authorization
 * header and hands the caller's identity to handlers.
 *
 * Unlike the socket handshake there is no guest fallback here: a REST caller
 * without a valid token is rejected with 401.
 */

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::handshake::bearer_token;
use crate::backend::notifications::dispatcher::Inbox;
use crate::backend::server::state::AppState;
use crate::shared::identity::Role;
use crate::shared::locale::Locale;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub identity_key: String,
    pub display_name: String,
    pub role: Role,
    /// Locale used to render lists for this request
    pub locale: Locale,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// The notification list this caller works on
    pub fn inbox(&self) -> Inbox {
        Inbox::for_identity(&self.identity_key, self.role)
    }
}

/// Verify the bearer token of a request
pub fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, StatusCode> {
    let token = bearer_token(headers, None).ok_or_else(|| {
        tracing::warn!("[Auth] Missing bearer token");
        StatusCode::UNAUTHORIZED
    })?;

    let claims = app_state.handshake.keys().verify_token(&token).map_err(|e| {
        tracing::warn!("[Auth] Invalid token: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    Ok(AuthenticatedUser {
        display_name: claims.display_name(),
        role: claims.role(),
        locale: app_state.handshake.resolver().resolve_from_headers(headers, None),
        identity_key: claims.sub,
    })
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the bearer token from the Authorization header
/// 2. Verifies it with the server's session keys
/// 3. Attaches the caller to request extensions for use in handlers
///
/// Returns 401 Unauthorized if the token is missing or invalid
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = authenticate(&app_state, request.headers())?;
    tracing::debug!("[Auth] {} authenticated as {:?}", user.identity_key, user.role);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extract authenticated user from request extensions
///
/// This is a helper function for handlers to get the authenticated user
/// that was set by the auth middleware.
pub fn extract_authenticated_user<B>(request: &axum::http::Request<B>) -> Result<AuthenticatedUser, StatusCode> {
    request.extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| {
            tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
            StatusCode::UNAUTHORIZED
        })
}

/// Axum extractor for authenticated user
///
/// This can be used as a parameter in handlers to automatically extract
/// the authenticated user from request extensions.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts.extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
                StatusCode::UNAUTHORIZED
            })?;

        Ok(AuthUser(user))
    }
}
