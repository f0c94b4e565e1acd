use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent settings read from `config.toml`.
///
/// Every field is optional so a partially written file still loads; the
/// effective value for an unset field comes from [`crate::core::config::defaults`].
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of an OpenAI-compatible API (e.g., "https://api.openai.com/v1")
    pub base_url: Option<String>,
    /// Model identifier sent with every completion request
    pub model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Language translations are produced in
    pub target_language: Option<String>,
    /// Render the finished result as markdown instead of raw streamed text
    pub markdown: Option<bool>,
}

/// Keys accepted by `config set` / `config unset`.
pub const CONFIG_KEYS: &[&str] = &[
    "base-url",
    "model",
    "api-key-env",
    "target-language",
    "markdown",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKeyError {
    UnknownKey(String),
    InvalidValue { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigKeyError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (expected one of: {})",
                CONFIG_KEYS.join(", ")
            ),
            ConfigKeyError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {key}: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigKeyError {}

impl Config {
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        if value.is_empty() {
            return self.unset_value(key);
        }

        match key {
            "base-url" => self.base_url = Some(value.to_string()),
            "model" => self.model = Some(value.to_string()),
            "api-key-env" => self.api_key_env = Some(value.to_string()),
            "target-language" => self.target_language = Some(value.to_string()),
            "markdown" => self.markdown = Some(parse_toggle("markdown", value)?),
            other => return Err(ConfigKeyError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigKeyError> {
        match key {
            "base-url" => self.base_url = None,
            "model" => self.model = None,
            "api-key-env" => self.api_key_env = None,
            "target-language" => self.target_language = None,
            "markdown" => self.markdown = None,
            other => return Err(ConfigKeyError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_toggle(key: &'static str, value: &str) -> Result<bool, ConfigKeyError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigKeyError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
