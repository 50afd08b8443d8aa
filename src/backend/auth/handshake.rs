/**
 * Connection Handshake
 *
 * Establishes who is on the other end of a new socket before any event is
 * processed.
 *
 * # Identity
 *
 * - A valid bearer token (`Authorization` header or `token` query parameter)
 *   makes the connection a `user` or `admin` keyed by the token subject.
 * - Anything else is a guest. The guest key is read from the guest cookie so
 *   presence survives reconnects; a visitor without one gets a fresh
 *   `g-<uuid>` key which is handed back as a `Set-Cookie` on the upgrade
 *   response.
 *
 * An invalid token is not an error: the visitor simply continues as a guest.
 */
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::auth::sessions::SessionKeys;
use crate::backend::locale::LocaleResolver;
use crate::shared::identity::{ConnectionIdentity, Role};

/// Default name of the guest identity cookie
pub const DEFAULT_GUEST_COOKIE: &str = "guest_id";

/// Prefix every guest identity key carries
pub const GUEST_KEY_PREFIX: &str = "g-";

/// One year, in seconds
const GUEST_COOKIE_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Query parameters accepted on the socket upgrade request
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
    pub locale: Option<String>,
}

/// Result of identifying a connection
#[derive(Debug, Clone)]
pub struct HandshakeOutcome {
    pub identity: ConnectionIdentity,
    /// `Set-Cookie` value to attach when a guest key was minted
    pub set_cookie: Option<String>,
}

/// Read one cookie out of the `Cookie` header(s)
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Bearer token from the `Authorization` header, else from the query string
pub fn bearer_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .or(query_token)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Whether a cookie value looks like a key this server minted
pub fn is_valid_guest_key(key: &str) -> bool {
    key.strip_prefix(GUEST_KEY_PREFIX).is_some_and(|rest| {
        !rest.is_empty()
            && rest.len() <= 64
            && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

pub fn mint_guest_key() -> String {
    format!("{}{}", GUEST_KEY_PREFIX, Uuid::new_v4())
}

fn guest_display_name(key: &str) -> String {
    let short: String = key
        .trim_start_matches(GUEST_KEY_PREFIX)
        .chars()
        .take(6)
        .collect();
    format!("Guest {}", short)
}

/// Resolves the identity of an incoming connection
#[derive(Debug, Clone)]
pub struct Handshake {
    keys: SessionKeys,
    resolver: LocaleResolver,
    guest_cookie: String,
}

impl Handshake {
    pub fn new(keys: SessionKeys, resolver: LocaleResolver, guest_cookie: impl Into<String>) -> Self {
        Self {
            keys,
            resolver,
            guest_cookie: guest_cookie.into(),
        }
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    /// Identify a connection from its upgrade request
    pub fn identify(&self, headers: &HeaderMap, query: &HandshakeQuery) -> HandshakeOutcome {
        let locale = self
            .resolver
            .resolve_from_headers(headers, query.locale.as_deref());

        if let Some(token) = bearer_token(headers, query.token.as_deref()) {
            match self.keys.verify_token(&token) {
                Ok(claims) => {
                    let identity = ConnectionIdentity::new(
                        claims.sub.clone(),
                        claims.role(),
                        claims.display_name(),
                        locale,
                    );
                    return HandshakeOutcome {
                        identity,
                        set_cookie: None,
                    };
                }
                Err(e) => {
                    tracing::warn!("[Handshake] Invalid token, continuing as guest: {}", e);
                }
            }
        }

        let existing = cookie_value(headers, &self.guest_cookie).filter(|key| is_valid_guest_key(key));
        let (key, set_cookie) = match existing {
            Some(key) => (key, None),
            None => {
                let key = mint_guest_key();
                let cookie = format!(
                    "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
                    self.guest_cookie, key, GUEST_COOKIE_MAX_AGE
                );
                tracing::debug!("[Handshake] Minted guest key {}", key);
                (key, Some(cookie))
            }
        };

        let identity = ConnectionIdentity::new(key.clone(), Role::Guest, guest_display_name(&key), locale);
        HandshakeOutcome {
            identity,
            set_cookie,
        }
    }
}
