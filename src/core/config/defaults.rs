use crate::core::config::data::Config;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TARGET_LANGUAGE: &str = "Japanese";

pub const BASE_URL_ENV: &str = "AI_TRANSLATE_BASE_URL";
pub const MODEL_ENV: &str = "AI_TRANSLATE_MODEL";

impl Config {
    pub fn effective_base_url(&self) -> String {
        env_override(BASE_URL_ENV)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn effective_model(&self) -> String {
        env_override(MODEL_ENV)
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn effective_api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    pub fn effective_target_language(&self) -> &str {
        self.target_language
            .as_deref()
            .unwrap_or(DEFAULT_TARGET_LANGUAGE)
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(false)
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
