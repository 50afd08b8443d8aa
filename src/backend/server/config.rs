/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration.
 *
 * # Configuration Sources
 *
 * Later sources override earlier ones:
 * 1. Built-in defaults
 * 2. `.env` in the working directory (via `dotenv`)
 * 3. An optional TOML file named by `PORTAL_CONFIG` (lowercase keys)
 * 4. Environment variables (uppercase keys)
 *
 * # Error Handling
 *
 * Malformed values are fatal at startup. Optional services (database,
 * SMTP) that are simply not configured are left out and the server runs
 * without them.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sqlx::PgPool;

use crate::backend::error::ConfigError;
use crate::backend::notifications::dispatcher::DispatcherSettings;
use crate::backend::notifications::mailer::SmtpSettings;
use crate::shared::locale::Locale;

/// Environment variable naming the optional TOML config file
pub const CONFIG_FILE_ENV: &str = "PORTAL_CONFIG";

/// Everything the server reads at startup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server_port: u16,
    pub database_url: Option<String>,
    pub locales_dir: PathBuf,
    pub default_locale: String,
    pub jwt_secret: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub email_timeout_secs: u64,
    pub public_base_url: Option<String>,
    pub guest_cookie: String,
    pub admin_email: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_url: None,
            locales_dir: PathBuf::from("locales"),
            default_locale: "en".to_string(),
            jwt_secret: None,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            email_timeout_secs: 10,
            public_base_url: None,
            guest_cookie: crate::backend::auth::handshake::DEFAULT_GUEST_COOKIE.to_string(),
            admin_email: None,
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ServerConfig {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => {
                tracing::info!("[Config] Reading {}", path);
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Apply uppercase overrides from `lookup` (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);

        if let Some(raw) = get("SERVER_PORT") {
            self.server_port = parse_value("SERVER_PORT", &raw)?;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(dir) = get("LOCALES_DIR") {
            self.locales_dir = PathBuf::from(dir);
        }
        if let Some(locale) = get("DEFAULT_LOCALE") {
            self.default_locale = locale;
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
        if let Some(host) = get("SMTP_HOST") {
            self.smtp_host = Some(host);
        }
        if let Some(raw) = get("SMTP_PORT") {
            self.smtp_port = parse_value("SMTP_PORT", &raw)?;
        }
        if let Some(username) = get("SMTP_USERNAME") {
            self.smtp_username = Some(username);
        }
        if let Some(password) = get("SMTP_PASSWORD") {
            self.smtp_password = Some(password);
        }
        if let Some(from) = get("SMTP_FROM") {
            self.smtp_from = Some(from);
        }
        if let Some(raw) = get("EMAIL_TIMEOUT_SECS") {
            self.email_timeout_secs = parse_value("EMAIL_TIMEOUT_SECS", &raw)?;
        }
        if let Some(url) = get("PUBLIC_BASE_URL") {
            self.public_base_url = Some(url);
        }
        if let Some(cookie) = get("GUEST_COOKIE") {
            self.guest_cookie = cookie;
        }
        if let Some(email) = get("ADMIN_EMAIL") {
            self.admin_email = Some(email);
        }
        Ok(())
    }

    /// Reject values that parse but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_locale()?;
        if self.email_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "EMAIL_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.guest_cookie.contains([';', '=', ' ']) {
            return Err(ConfigError::InvalidValue {
                key: "GUEST_COOKIE".to_string(),
                message: "not a valid cookie name".to_string(),
            });
        }
        Ok(())
    }

    /// The default locale; must be one of the supported set
    pub fn default_locale(&self) -> Result<Locale, ConfigError> {
        Locale::parse(&self.default_locale).ok_or_else(|| ConfigError::InvalidValue {
            key: "DEFAULT_LOCALE".to_string(),
            message: format!("'{}' is not a supported locale", self.default_locale),
        })
    }

    /// SMTP settings, or `None` when email is disabled
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        let host = self.smtp_host.clone()?;
        Some(SmtpSettings {
            from: self
                .smtp_from
                .clone()
                .unwrap_or_else(|| format!("noreply@{}", host)),
            host,
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
        })
    }

    pub fn dispatcher_settings(&self) -> Result<DispatcherSettings, ConfigError> {
        Ok(DispatcherSettings {
            default_locale: self.default_locale()?,
            email_timeout: Duration::from_secs(self.email_timeout_secs),
            public_base_url: self.public_base_url.clone(),
            admin_email: self.admin_email.clone(),
        })
    }
}

/// Database configuration result
///
/// Contains the database connection pool if successfully configured,
/// or `None` if the database is not available.
pub type DatabaseConfig = Option<PgPool>;

/// Load and initialize database connection pool
///
/// This function:
/// 1. Takes `DATABASE_URL` from the loaded configuration
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// # Returns
///
/// - `Some(PgPool)` if database is successfully configured
/// - `None` if `DATABASE_URL` is not set or connection fails
///
/// # Errors
///
/// Errors are logged but do not prevent server startup. The function
/// returns `None` on any error, and the server falls back to in-memory
/// notification storage.
pub async fn load_database(database_url: Option<&str>) -> DatabaseConfig {
    let Some(database_url) = database_url else {
        tracing::warn!("[Config] DATABASE_URL not set. Notifications will be kept in memory.");
        return None;
    };

    tracing::info!("[Config] Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("[Config] Failed to create database connection pool: {:?}", e);
            tracing::warn!("[Config] Notifications will be kept in memory.");
            return None;
        }
    };

    tracing::info!("[Config] Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("[Config] Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("[Config] Failed to run database migrations: {}", e);
            tracing::warn!("[Config] Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
