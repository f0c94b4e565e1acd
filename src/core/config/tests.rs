use super::data::{Config, ConfigKeyError};
use super::defaults::{
    BASE_URL_ENV, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TARGET_LANGUAGE,
    MODEL_ENV,
};
use super::io::ConfigError;
use crate::utils::test_utils::EnvVarGuard;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.effective_api_key_env(), DEFAULT_API_KEY_ENV);
    assert_eq!(config.effective_target_language(), DEFAULT_TARGET_LANGUAGE);
    assert!(!config.markdown_enabled());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.set_value("model", "gpt-4o").expect("set model");
    config
        .set_value("target-language", "French")
        .expect("set language");
    config.set_value("markdown", "on").expect("set markdown");
    config.save_to_path(&config_path).expect("save");

    let loaded = Config::load_from_path(&config_path).expect("load");
    assert_eq!(loaded.model.as_deref(), Some("gpt-4o"));
    assert_eq!(loaded.effective_target_language(), "French");
    assert!(loaded.markdown_enabled());

    let mut loaded = loaded;
    loaded.unset_value("model").expect("unset");
    loaded.save_to_path(&config_path).expect("save again");

    let reloaded = Config::load_from_path(&config_path).expect("reload");
    assert_eq!(reloaded.model, None);
    assert_eq!(reloaded.target_language.as_deref(), Some("French"));
}

#[test]
fn set_value_rejects_unknown_keys_and_bad_toggles() {
    let mut config = Config::default();

    assert_eq!(
        config.set_value("theme", "dark"),
        Err(ConfigKeyError::UnknownKey("theme".to_string()))
    );
    assert!(matches!(
        config.set_value("markdown", "sometimes"),
        Err(ConfigKeyError::InvalidValue { key: "markdown", .. })
    ));
    assert_eq!(config, Config::default());
}

#[test]
fn blank_value_unsets_the_key() {
    let mut config = Config {
        api_key_env: Some("MY_KEY".to_string()),
        ..Default::default()
    };

    config.set_value("api-key-env", "   ").expect("blank set");
    assert_eq!(config.api_key_env, None);
}

#[test]
fn parse_error_reports_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "model = [unterminated").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

fn config_with_endpoint() -> Config {
    Config {
        base_url: Some("https://file.example.com/v1".to_string()),
        model: Some("file-model".to_string()),
        ..Default::default()
    }
}

#[test]
fn env_overrides_beat_config_file_values() {
    let _env = EnvVarGuard::new(&[
        (BASE_URL_ENV, Some("http://env.example.com/v1")),
        (MODEL_ENV, Some("env-model")),
    ]);

    let config = config_with_endpoint();
    assert_eq!(config.effective_base_url(), "http://env.example.com/v1");
    assert_eq!(config.effective_model(), "env-model");

    let defaults = Config::default();
    assert_eq!(defaults.effective_base_url(), "http://env.example.com/v1");
    assert_eq!(defaults.effective_model(), "env-model");
}

#[test]
fn config_file_values_beat_defaults() {
    let _env = EnvVarGuard::without_overrides();

    let config = config_with_endpoint();
    assert_eq!(config.effective_base_url(), "https://file.example.com/v1");
    assert_eq!(config.effective_model(), "file-model");

    let defaults = Config::default();
    assert_eq!(defaults.effective_base_url(), DEFAULT_BASE_URL);
    assert_eq!(defaults.effective_model(), DEFAULT_MODEL);
}

#[test]
fn blank_env_override_is_ignored() {
    let _env = EnvVarGuard::new(&[(BASE_URL_ENV, Some("   ")), (MODEL_ENV, Some(""))]);

    let config = config_with_endpoint();
    assert_eq!(config.effective_base_url(), "https://file.example.com/v1");
    assert_eq!(config.effective_model(), "file-model");
}
