//! Supported Locales
//!
//! The portal speaks a small, fixed set of languages. Every locale string that
//! reaches the system (handshake hints, cookies, `set_locale` requests, stored
//! profile preferences) is normalized into [`Locale`] through a
//! case-insensitive prefix match. Unknown input never fails; it degrades to
//! the caller's default.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A locale the portal has dictionaries for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English, the canonical storage language
    En,
    /// Icelandic
    Is,
}

/// Every supported locale, in match priority order
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Is];

impl Locale {
    /// Two-letter code used on the wire and for dictionary file names
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Is => "is",
        }
    }

    /// Match a candidate against the supported set
    ///
    /// The candidate is trimmed and lowercased; the first supported code it
    /// starts with wins, so `"IS-is"`, `"en_US"` and `"english"` all resolve.
    pub fn parse(candidate: &str) -> Option<Self> {
        let normalized = candidate.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }
        SUPPORTED_LOCALES
            .iter()
            .copied()
            .find(|locale| normalized.starts_with(locale.code()))
    }

    /// Map any candidate (or none) to a supported locale
    pub fn normalize(candidate: Option<&str>, default: Locale) -> Locale {
        candidate.and_then(Self::parse).unwrap_or(default)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::En
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
