use crate::core::config::Config;
use crate::core::error::ConfigurationError;
use std::path::PathBuf;
use tracing::debug;

/// Everything the model client needs to open one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ProviderSettings {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Resolves provider settings at the start of each generation attempt.
pub trait SettingsSource: Send + Sync {
    fn resolve(&self) -> Result<ProviderSettings, ConfigurationError>;
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Reads `config.toml` and the API key environment variable on every
/// resolution, so edits take effect on the next retry.
#[derive(Debug, Clone, Default)]
pub struct ConfigFileSettings {
    path: Option<PathBuf>,
    overrides: SettingsOverrides,
}

impl ConfigFileSettings {
    pub fn new(overrides: SettingsOverrides) -> Self {
        Self {
            path: None,
            overrides,
        }
    }

    pub fn with_path(path: PathBuf, overrides: SettingsOverrides) -> Self {
        Self {
            path: Some(path),
            overrides,
        }
    }

    fn load_config(&self) -> Result<Config, ConfigurationError> {
        let loaded = match &self.path {
            Some(path) => Config::load_from_path(path),
            None => Config::load(),
        };
        loaded.map_err(|err| ConfigurationError::Unreadable(err.to_string()))
    }
}

impl SettingsSource for ConfigFileSettings {
    fn resolve(&self) -> Result<ProviderSettings, ConfigurationError> {
        let config = self.load_config()?;
        settings_from_config(&config, &self.overrides)
    }
}

pub fn settings_from_config(
    config: &Config,
    overrides: &SettingsOverrides,
) -> Result<ProviderSettings, ConfigurationError> {
    let env_var = config.effective_api_key_env();
    let api_key = std::env::var(env_var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigurationError::MissingApiKey {
            env_var: env_var.to_string(),
        })?;

    let base_url = overrides
        .base_url
        .clone()
        .unwrap_or_else(|| config.effective_base_url());
    validate_base_url(&base_url)?;

    let model = overrides
        .model
        .clone()
        .unwrap_or_else(|| config.effective_model());

    debug!(base_url = %base_url, model = %model, "Resolved provider settings");

    Ok(ProviderSettings {
        api_key,
        base_url,
        model,
    })
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };

    let parsed = reqwest::Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Fixed settings, for embedding callers that manage configuration themselves.
#[derive(Debug, Clone)]
pub struct StaticSettings(pub ProviderSettings);

impl SettingsSource for StaticSettings {
    fn resolve(&self) -> Result<ProviderSettings, ConfigurationError> {
        Ok(self.0.clone())
    }
}
