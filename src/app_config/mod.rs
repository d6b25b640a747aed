//! Per-request application configuration.
//!
//! An [`AppConfig`] is a flat map of named settings (theme colors, page
//! metadata, feature switches) to primitive values. The compiled-in defaults
//! declare every key that may appear; the [`ConfigResolver`] overlays values
//! fetched from a remote sandbox endpoint when one is configured.

mod resolver;

pub use resolver::*;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Well-known app config keys.
pub mod keys {
    pub const SANDBOX_ID: &str = "sandboxId";
    pub const COMPANY_NAME: &str = "companyName";
    pub const PAGE_TITLE: &str = "pageTitle";
    pub const PAGE_DESCRIPTION: &str = "pageDescription";
    pub const SUPPORTS_CHAT_INPUT: &str = "supportsChatInput";
    pub const SUPPORTS_VIDEO_INPUT: &str = "supportsVideoInput";
    pub const SUPPORTS_SCREEN_SHARE: &str = "supportsScreenShare";
    pub const IS_PRE_CONNECT_BUFFER_ENABLED: &str = "isPreConnectBufferEnabled";
    pub const LOGO: &str = "logo";
    pub const ACCENT: &str = "accent";
    pub const LOGO_DARK: &str = "logoDark";
    pub const ACCENT_DARK: &str = "accentDark";
    pub const START_BUTTON_TEXT: &str = "startButtonText";
    pub const AGENT_NAME: &str = "agentName";
}

// ============================================================================
// Values
// ============================================================================

/// Primitive type of a config value, named the way the remote payload names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        }
    }

    /// Runtime kind of an arbitrary JSON value, if it is a primitive.
    pub fn of_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(_) => Some(ValueKind::String),
            serde_json::Value::Number(_) => Some(ValueKind::Number),
            serde_json::Value::Bool(_) => Some(ValueKind::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A primitive app config value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Boolean,
            ConfigValue::Number(_) => ValueKind::Number,
            ConfigValue::String(_) => ValueKind::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert a JSON value, returning `None` for null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(ConfigValue::String(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(ConfigValue::Number),
            serde_json::Value::Bool(b) => Some(ConfigValue::Bool(*b)),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<f64> for ConfigValue {
    fn from(n: f64) -> Self {
        ConfigValue::Number(n)
    }
}

// ============================================================================
// AppConfig
// ============================================================================

/// Flat app configuration.
///
/// A key may be declared without a value (`agentName` in the defaults); such
/// keys are omitted when serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    entries: BTreeMap<String, Option<ConfigValue>>,
}

impl AppConfig {
    /// The compiled-in defaults.
    pub fn defaults() -> Self {
        let entries: [(&str, Option<ConfigValue>); 13] = [
            (keys::COMPANY_NAME, Some("LiveKit".into())),
            (keys::PAGE_TITLE, Some("LiveKit Voice Agent".into())),
            (
                keys::PAGE_DESCRIPTION,
                Some("A voice agent built with LiveKit".into()),
            ),
            (keys::SUPPORTS_CHAT_INPUT, Some(true.into())),
            (keys::SUPPORTS_VIDEO_INPUT, Some(true.into())),
            (keys::SUPPORTS_SCREEN_SHARE, Some(true.into())),
            (keys::IS_PRE_CONNECT_BUFFER_ENABLED, Some(true.into())),
            (keys::LOGO, Some("/lk-logo.svg".into())),
            (keys::ACCENT, Some("#002cf2".into())),
            (keys::LOGO_DARK, Some("/lk-logo-dark.svg".into())),
            (keys::ACCENT_DARK, Some("#1fd5f9".into())),
            (keys::START_BUTTON_TEXT, Some("Start call".into())),
            (keys::AGENT_NAME, None),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// Defaults seeded with a sandbox id, the starting point of a merge.
    pub fn with_sandbox_id(sandbox_id: &str) -> Self {
        let mut config = Self::defaults();
        config
            .entries
            .insert(keys::SANDBOX_ID.to_string(), Some(sandbox_id.into()));
        config
    }

    /// Whether `key` is declared, with or without a value.
    pub fn declares(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    /// Set (or clear) a value.
    pub(crate) fn set(&mut self, key: &str, value: Option<ConfigValue>) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
    }

    pub fn sandbox_id(&self) -> Option<&str> {
        self.get_str(keys::SANDBOX_ID)
    }

    pub fn accent(&self) -> &str {
        self.get_str(keys::ACCENT).unwrap_or_default()
    }

    pub fn accent_dark(&self) -> &str {
        self.get_str(keys::ACCENT_DARK).unwrap_or_default()
    }

    pub fn page_title(&self) -> &str {
        self.get_str(keys::PAGE_TITLE).unwrap_or_default()
    }

    pub fn page_description(&self) -> &str {
        self.get_str(keys::PAGE_DESCRIPTION).unwrap_or_default()
    }

    pub fn agent_name(&self) -> Option<&str> {
        self.get_str(keys::AGENT_NAME)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Serialize for AppConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
