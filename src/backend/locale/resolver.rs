/**
 * Locale Resolver
 *
 * Derives the outbound locale of a connection from its handshake.
 *
 * # Resolution order
 *
 * 1. Explicit hint (`locale` query parameter or `X-Locale` header)
 * 2. `locale` cookie
 * 3. First tag of `Accept-Language`
 * 4. The configured default
 *
 * A candidate that does not normalize to a supported locale is skipped and
 * the next source is tried. Nothing here ever fails.
 */
use axum::http::HeaderMap;

use crate::backend::auth::handshake::cookie_value;
use crate::shared::locale::Locale;

/// Cookie holding the visitor's preferred locale
pub const LOCALE_COOKIE: &str = "locale";

/// Header carrying an explicit locale hint
pub const LOCALE_HEADER: &str = "x-locale";

/// Locale sources available at handshake time
#[derive(Debug, Default, Clone, Copy)]
pub struct HandshakeHints<'a> {
    pub explicit: Option<&'a str>,
    pub cookie: Option<&'a str>,
    pub accept_language: Option<&'a str>,
}

/// Normalizes locale candidates against the supported set
#[derive(Debug, Clone, Copy)]
pub struct LocaleResolver {
    default: Locale,
}

impl LocaleResolver {
    pub fn new(default: Locale) -> Self {
        Self { default }
    }

    pub fn default_locale(&self) -> Locale {
        self.default
    }

    /// Map any candidate to a supported locale, falling back to the default
    pub fn normalize(&self, candidate: Option<&str>) -> Locale {
        Locale::normalize(candidate, self.default)
    }

    /// Pick the locale for a new connection
    pub fn resolve_for_connection(&self, hints: &HandshakeHints<'_>) -> Locale {
        let accept_language = hints
            .accept_language
            .and_then(|value| value.split(',').next())
            .map(|tag| tag.split(';').next().unwrap_or(tag));

        [hints.explicit, hints.cookie, accept_language]
            .into_iter()
            .flatten()
            .find_map(Locale::parse)
            .unwrap_or(self.default)
    }

    /// Resolve from upgrade request headers and an optional query hint
    pub fn resolve_from_headers(&self, headers: &HeaderMap, query_hint: Option<&str>) -> Locale {
        let header_hint = headers.get(LOCALE_HEADER).and_then(|h| h.to_str().ok());
        let cookie = cookie_value(headers, LOCALE_COOKIE);
        let accept_language = headers
            .get(axum::http::header::ACCEPT_LANGUAGE)
            .and_then(|h| h.to_str().ok());

        self.resolve_for_connection(&HandshakeHints {
            explicit: query_hint.or(header_hint),
            cookie: cookie.as_deref(),
            accept_language,
        })
    }
}

impl Default for LocaleResolver {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}
