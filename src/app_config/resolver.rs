use super::{AppConfig, ConfigValue, ValueKind};
use crate::config::{AppConfigSourceSettings, SANDBOX_ID_HEADER};

use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Remote payload: field name to entry, `null` meaning "omit".
pub type SandboxConfig = BTreeMap<String, serde_json::Value>;

/// One remote field, `{ "type": ..., "value": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxConfigEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Why a remote config resolution fell back to defaults.
#[derive(Debug, Error)]
pub enum ConfigFetchError {
    #[error("Sandbox ID is required")]
    MissingSandboxId,
    #[error("config request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("config endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed config payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Resolves the [`AppConfig`] for one inbound request.
///
/// Resolution never fails: every error is logged and answered with the
/// compiled-in defaults. There is no cache and no retry; each call performs
/// at most one fetch.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    client: reqwest::Client,
    endpoint: Option<Url>,
    sandbox_id: Option<String>,
}

impl ConfigResolver {
    pub fn new(source: &AppConfigSourceSettings) -> Result<Self, ConfigFetchError> {
        let client = reqwest::Client::builder()
            .timeout(source.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: source.endpoint.clone(),
            sandbox_id: source.sandbox_id.clone(),
        })
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// Resolve the config, using `header_sandbox_id` when no fixed sandbox id
    /// is configured.
    pub async fn resolve(&self, header_sandbox_id: Option<&str>) -> AppConfig {
        let Some(endpoint) = &self.endpoint else {
            return AppConfig::defaults();
        };

        match self.fetch(endpoint, header_sandbox_id).await {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to resolve app config from {}: {}", endpoint, e);
                AppConfig::defaults()
            }
        }
    }

    async fn fetch(
        &self,
        endpoint: &Url,
        header_sandbox_id: Option<&str>,
    ) -> Result<AppConfig, ConfigFetchError> {
        let sandbox_id = match &self.sandbox_id {
            Some(id) => id.as_str(),
            None => header_sandbox_id.unwrap_or(""),
        };

        if sandbox_id.is_empty() {
            return Err(ConfigFetchError::MissingSandboxId);
        }

        debug!("Fetching app config for sandbox {}", sandbox_id);

        let response = self
            .client
            .get(endpoint.clone())
            .header(SANDBOX_ID_HEADER, sandbox_id)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigFetchError::Status(status));
        }

        let body = response.text().await?;
        let remote: SandboxConfig = serde_json::from_str(&body)?;

        Ok(merge_remote_config(sandbox_id, &remote))
    }
}

/// Overlay a remote payload on the defaults.
///
/// A field is taken when its key is declared in the defaults without a value,
/// or when both its declared type and its value's type match the type of the
/// current value. Everything else keeps the default.
pub fn merge_remote_config(sandbox_id: &str, remote: &SandboxConfig) -> AppConfig {
    let defaults = AppConfig::defaults();
    let mut config = AppConfig::with_sandbox_id(sandbox_id);

    for (key, raw) in remote {
        if raw.is_null() {
            continue;
        }

        let entry: SandboxConfigEntry = match serde_json::from_value(raw.clone()) {
            Ok(entry) => entry,
            Err(_) => {
                debug!("Skipping app config field '{}': not a typed entry", key);
                continue;
            }
        };

        let declared_unset = defaults.declares(key) && defaults.get(key).is_none();
        let current_kind = config.get(key).map(ConfigValue::kind);
        let value_kind = entry.value.as_ref().and_then(ValueKind::of_json);
        let types_match = current_kind.is_some_and(|kind| {
            kind.as_str() == entry.kind && value_kind == Some(kind)
        });

        if !(declared_unset || types_match) {
            debug!(
                "Dropping app config field '{}': declared {} does not match default",
                key, entry.kind
            );
            continue;
        }

        match entry.value.as_ref() {
            None | Some(serde_json::Value::Null) => config.set(key, None),
            Some(value) => match ConfigValue::from_json(value) {
                Some(value) => config.set(key, Some(value)),
                None => debug!("Dropping app config field '{}': not a primitive", key),
            },
        }
    }

    config
}
