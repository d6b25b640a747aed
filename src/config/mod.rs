mod defaults;
mod types;
mod validation;

pub use defaults::*;
pub use types::*;
pub use validation::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub app_config: AppConfigSourceSettings,
    #[serde(default)]
    pub battle: BattleSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Development build: theme overrides are always emitted.
    #[serde(default)]
    pub dev_mode: bool,
}

impl Settings {
    /// Load settings from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings_path = path.map(PathBuf::from).or_else(find_settings_file);

        let mut settings = match settings_path {
            Some(ref p) if p.exists() => {
                info!("Loading settings from {}", p.display());
                load_settings_file(p)?
            }
            Some(ref p) => {
                warn!("Settings file {} not found, using defaults", p.display());
                Settings::default()
            }
            None => {
                info!("No settings file found, using defaults");
                Settings::default()
            }
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(settings)
    }

    /// Apply environment variable overrides using the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("APP_CONFIG_ENDPOINT").filter(|s| !s.trim().is_empty()) {
            match url::Url::parse(endpoint.trim()) {
                Ok(url) => self.app_config.endpoint = Some(url),
                Err(e) => warn!("Ignoring invalid APP_CONFIG_ENDPOINT '{}': {}", endpoint, e),
            }
        }

        if let Some(sandbox_id) = lookup("SANDBOX_ID") {
            self.app_config.sandbox_id = Some(sandbox_id);
        }

        if let Some(port) = lookup("BATTLE_WEB_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Some(bind) = lookup("BATTLE_WEB_BIND") {
            self.server.bind = bind;
        }

        if let Some(env) = lookup("BATTLE_WEB_ENV") {
            self.dev_mode = env.eq_ignore_ascii_case("development");
        }
    }
}

/// Find the settings file in standard locations.
fn find_settings_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("battle-web.json"),
        PathBuf::from("battle-web.json5"),
        PathBuf::from("battle-web.yaml"),
        PathBuf::from("battle-web.yml"),
        PathBuf::from("battle-web.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    if let Some(home) = dirs::home_dir() {
        let home_settings = home.join(".battle-web").join("config.json");
        if home_settings.exists() {
            return Some(home_settings);
        }
    }

    None
}

/// Load settings from a file path.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;

    let settings = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => json5::from_str(&content)
            .with_context(|| format!("Invalid settings file '{}'", path.display()))?,
    };

    Ok(settings)
}
