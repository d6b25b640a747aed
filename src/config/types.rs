use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

// ============================================================================
// Server Settings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Remote App Config Source
// ============================================================================

/// Where the per-request app configuration comes from.
///
/// With no `endpoint` the compiled-in defaults are served as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfigSourceSettings {
    pub endpoint: Option<Url>,
    /// Fixed sandbox id. Takes precedence over the `X-Sandbox-ID` header.
    pub sandbox_id: Option<String>,
    #[serde(default = "default_app_config_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AppConfigSourceSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            sandbox_id: None,
            timeout_ms: DEFAULT_APP_CONFIG_TIMEOUT_MS,
        }
    }
}

impl AppConfigSourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ============================================================================
// Battle
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSettings {
    #[serde(default = "default_max_instruction_words")]
    pub max_instruction_words: usize,
    #[serde(default = "default_agent_ready_timeout_ms")]
    pub agent_ready_timeout_ms: u64,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            max_instruction_words: DEFAULT_MAX_INSTRUCTION_WORDS,
            agent_ready_timeout_ms: DEFAULT_AGENT_READY_TIMEOUT_MS,
        }
    }
}

impl BattleSettings {
    /// How long a started session waits for the agent to become ready.
    pub fn agent_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_ready_timeout_ms)
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    #[serde(default)]
    pub json: bool,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_app_config_timeout_ms() -> u64 {
    DEFAULT_APP_CONFIG_TIMEOUT_MS
}

fn default_max_instruction_words() -> usize {
    DEFAULT_MAX_INSTRUCTION_WORDS
}

fn default_agent_ready_timeout_ms() -> u64 {
    DEFAULT_AGENT_READY_TIMEOUT_MS
}
