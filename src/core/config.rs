//! Configuration from the environment (and `.env`).

use std::env;

use async_openai::config::OpenAIConfig;

use crate::core::models::ParameterOverrides;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_config: OpenAIConfig,
    pub model_id: String,
    pub base_url: String,
    pub api_key: String,
    /// Live parameter overrides merged over each model's defaults at call time.
    pub overrides: ParameterOverrides,
}

impl Config {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OMNICHAT_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Settings that can be resolved and shown without an API key.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub model_id: String,
    pub api_key_set: bool,
    pub overrides: ParameterOverrides,
}

pub fn settings() -> Result<Settings, ConfigError> {
    Ok(Settings {
        base_url: env::var("OMNICHAT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        model_id: env::var("OMNICHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        api_key_set: env::var("OMNICHAT_API_KEY").is_ok_and(|k| !k.trim().is_empty()),
        overrides: ParameterOverrides {
            max_tokens: parse_var("OMNICHAT_MAX_TOKENS")?,
            temperature: parse_var("OMNICHAT_TEMPERATURE")?,
        },
    })
}

/// Load configuration from environment. Returns an error if API key is missing.
pub fn load() -> Result<Config, ConfigError> {
    let Settings {
        base_url,
        model_id,
        overrides,
        ..
    } = settings()?;

    let api_key = env::var("OMNICHAT_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey)?;

    let openai_config = OpenAIConfig::new()
        .with_api_base(base_url.clone())
        .with_api_key(api_key.clone());

    Ok(Config {
        openai_config,
        model_id,
        base_url,
        api_key,
        overrides,
    })
}

fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        Err(_) => Ok(None),
    }
}
