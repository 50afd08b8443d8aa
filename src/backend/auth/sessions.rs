/**
 * Session Tokens
 *
 * This module handles JWT token generation and validation. The portal's
 * login flow lives outside the realtime core; this side only needs to verify
 * the bearer token presented at socket handshake or on the notification API
 * and read the caller's id, display name and role from it.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::shared::identity::Role;

/// Default token lifetime: 30 days
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Username shown to other room members
    #[serde(default)]
    pub username: Option<String>,
    /// `user` or `admin`; missing means `user`
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    pub fn role(&self) -> Role {
        Role::from_claim(self.role.as_deref())
    }

    /// Name to display for this session
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.sub.clone())
    }
}

/// Signing material for session tokens
#[derive(Clone)]
pub struct SessionKeys {
    secret: String,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Create a JWT token
    ///
    /// # Arguments
    /// * `user_id` - Subject of the token
    /// * `username` - Display name
    /// * `role` - Role claim
    ///
    /// # Returns
    /// JWT token string
    pub fn create_token(
        &self,
        user_id: &str,
        username: Option<&str>,
        role: Role,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            email: None,
            username: username.map(str::to_string),
            role: Some(match role {
                Role::Admin => "admin".to_string(),
                Role::User | Role::Guest => "user".to_string(),
            }),
            exp: now + DEFAULT_TOKEN_TTL_SECS,
            iat: now,
        };
        let key = EncodingKey::from_secret(self.secret.as_ref());
        encode(&Header::default(), &claims, &key)
    }

    /// Verify and decode a JWT token
    ///
    /// # Returns
    /// Decoded claims or error
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_secret(self.secret.as_ref());
        let validation = Validation::default();
        let token_data = decode::<Claims>(token, &key, &validation)?;
        Ok(token_data.claims)
    }
}
