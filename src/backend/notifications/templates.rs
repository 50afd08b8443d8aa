/**
 * Notification Template Resolver
 *
 * Turns a notification kind, an optional sub-event and a bag of data into
 * title/body/link text.
 *
 * # Dictionaries
 *
 * One JSON file per supported locale (`locales/en.json`, `locales/is.json`),
 * loaded once at startup and read-only afterwards. Entries are keyed by
 * `kind` (the kind default) or `kind.event`:
 *
 * ```json
 * {
 *   "subscription.created": {
 *     "title": "Subscription created",
 *     "body": "Hi {display_name}, your {plan} subscription has been created.",
 *     "link": "/account/subscriptions"
 *   }
 * }
 * ```
 *
 * Every field is optional. A missing file for a supported locale is a fatal
 * startup error.
 *
 * # Tokens
 *
 * `{a.b.c}` walks the merged data through dotted path segments. A missing
 * segment renders as an empty string; objects, arrays and null do too.
 *
 * # Fallback
 *
 * - Canonical (English): `kind.event` → `kind` → `generic` → built-in text
 * - Localized, per field: preferred locale → English → canonical value
 *
 * A field that renders to an empty string counts as missing, so a localized
 * title or body is never empty.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::backend::error::ConfigError;
use crate::shared::locale::{Locale, SUPPORTED_LOCALES};
use crate::shared::notification::{RenderedNotification, TemplateKey};

/// Title used when no dictionary has anything for a notification
pub const FALLBACK_TITLE: &str = "Notification";

/// Body used when no dictionary has anything for a notification
pub const FALLBACK_BODY: &str = "You have a new notification";

/// One dictionary entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TemplateEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Immutable templates of one locale
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<String, TemplateEntry>,
}

impl Dictionary {
    pub fn from_entries(entries: HashMap<String, TemplateEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_entries(serde_json::from_str(json)?))
    }

    /// Load a dictionary file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|e| ConfigError::InvalidDictionary {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Exact-key lookup, no fallback
    pub fn entry(&self, key: TemplateKey) -> Option<&TemplateEntry> {
        self.entries.get(&key.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All dictionaries, one per supported locale
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    dictionaries: HashMap<Locale, Dictionary>,
}

impl LocaleCatalog {
    /// Build from already-parsed dictionaries
    ///
    /// Fails when a supported locale has no dictionary.
    pub fn from_dictionaries(dictionaries: HashMap<Locale, Dictionary>) -> Result<Self, ConfigError> {
        if let Some(missing) = SUPPORTED_LOCALES
            .iter()
            .find(|locale| !dictionaries.contains_key(*locale))
        {
            return Err(ConfigError::MissingDictionary {
                locale: missing.code().to_string(),
                path: "<memory>".to_string(),
            });
        }
        Ok(Self { dictionaries })
    }

    /// Load `<dir>/<code>.json` for every supported locale
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let mut dictionaries = HashMap::new();
        for locale in SUPPORTED_LOCALES {
            let path: PathBuf = dir.join(format!("{}.json", locale.code()));
            if !path.is_file() {
                return Err(ConfigError::MissingDictionary {
                    locale: locale.code().to_string(),
                    path: path.display().to_string(),
                });
            }
            let dictionary = Dictionary::load(&path)?;
            tracing::info!(
                "[Templates] Loaded {} entries for '{}' from {}",
                dictionary.len(),
                locale,
                path.display()
            );
            dictionaries.insert(*locale, dictionary);
        }
        Self::from_dictionaries(dictionaries)
    }

    fn dictionary(&self, locale: Locale) -> Option<&Dictionary> {
        self.dictionaries.get(&locale)
    }

    /// Render the canonical English record
    pub fn render_canonical(&self, key: TemplateKey, data: &Value) -> RenderedNotification {
        let english = self.dictionary(Locale::En);
        let chain: Vec<&TemplateEntry> = [key, TemplateKey::kind_default(key.kind), TemplateKey::GENERIC]
            .into_iter()
            .filter_map(|candidate| english.and_then(|d| d.entry(candidate)))
            .collect();

        let pick = |field: fn(&TemplateEntry) -> Option<&String>| {
            chain
                .iter()
                .filter_map(|entry| field(entry))
                .map(|template| substitute_tokens(template, data))
                .find(|rendered| !rendered.trim().is_empty())
        };

        RenderedNotification {
            title: pick(entry_title).unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            body: pick(entry_body).unwrap_or_else(|| FALLBACK_BODY.to_string()),
            link: pick(entry_link),
        }
    }

    /// Render a localized variant, field by field
    ///
    /// `canonical` is the already-rendered English record; it is the last
    /// resort for each field.
    pub fn render_localized(
        &self,
        locale: Locale,
        key: TemplateKey,
        canonical: &RenderedNotification,
        data: &Value,
    ) -> RenderedNotification {
        let preferred = self.dictionary(locale).and_then(|d| d.entry(key));
        let english = self.dictionary(Locale::En).and_then(|d| d.entry(key));

        let pick = |field: fn(&TemplateEntry) -> Option<&String>| {
            [preferred, english]
                .into_iter()
                .flatten()
                .filter_map(|entry| field(entry))
                .map(|template| substitute_tokens(template, data))
                .find(|rendered| !rendered.trim().is_empty())
        };

        let title = pick(entry_title)
            .or_else(|| non_empty(&canonical.title))
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let body = pick(entry_body)
            .or_else(|| non_empty(&canonical.body))
            .unwrap_or_else(|| FALLBACK_BODY.to_string());
        let link = pick(entry_link).or_else(|| canonical.link.clone());

        RenderedNotification { title, body, link }
    }
}

fn entry_title(entry: &TemplateEntry) -> Option<&String> {
    entry.title.as_ref()
}

fn entry_body(entry: &TemplateEntry) -> Option<&String> {
    entry.body.as_ref()
}

fn entry_link(entry: &TemplateEntry) -> Option<&String> {
    entry.link.as_ref()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Shallow-merge identity fields and an event payload
///
/// Identity fields go in first, so any payload key overrides them. A payload
/// that is not an object is kept under the `payload` key.
pub fn merge_identity_and_payload(identity: Map<String, Value>, payload: &Value) -> Value {
    let mut merged = identity;
    match payload {
        Value::Object(fields) => {
            for (key, value) in fields {
                merged.insert(key.clone(), value.clone());
            }
        }
        Value::Null => {}
        other => {
            merged.insert("payload".to_string(), other.clone());
        }
    }
    Value::Object(merged)
}

/// Resolve a dotted path; `None` when any segment is missing
pub fn lookup_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn is_token_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .split('.')
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-'))
}

/// Replace every `{dotted.path}` token with data from `data`
///
/// Braces that do not enclose a valid path are left as they are.
pub fn substitute_tokens(template: &str, data: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_token_path(&after[..close]) => {
                out.push_str(&value_text(lookup_path(data, &after[..close])));
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
