use super::Settings;
use anyhow::Result;

/// Validation errors for settings.
#[derive(Debug, Clone)]
pub struct SettingsValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SettingsValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn error(path: &str, message: &str) -> SettingsValidationError {
    SettingsValidationError {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Validate a settings object.
pub fn validate_settings(settings: &Settings) -> Vec<SettingsValidationError> {
    let mut errors = Vec::new();

    if settings.server.port == 0 {
        errors.push(error("server.port", "Port must be greater than 0"));
    }

    if let Some(endpoint) = &settings.app_config.endpoint {
        if !matches!(endpoint.scheme(), "http" | "https") {
            errors.push(error(
                "appConfig.endpoint",
                "Endpoint must use http or https",
            ));
        }
    }

    if settings.app_config.timeout_ms == 0 {
        errors.push(error("appConfig.timeoutMs", "Timeout must be greater than 0"));
    }

    if settings.battle.max_instruction_words == 0 {
        errors.push(error(
            "battle.maxInstructionWords",
            "Word limit must be greater than 0",
        ));
    }

    if settings.battle.agent_ready_timeout_ms == 0 {
        errors.push(error(
            "battle.agentReadyTimeoutMs",
            "Timeout must be greater than 0",
        ));
    }

    errors
}

/// Validate settings and return Result.
pub fn validate_settings_object(settings: &Settings) -> Result<()> {
    let errors = validate_settings(settings);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Settings validation failed:\n{}", messages.join("\n"));
    }
}
