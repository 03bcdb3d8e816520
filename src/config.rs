use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::stock::ProviderConfig;

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_HISTORY_WINDOW: usize = 30;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} must be a valid positive number, got {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the chat-completion endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Sent as-is; an empty key is rejected by the provider, not here
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub llm: LlmConfig,
    pub history_window: usize,
    /// `None` disables the fetch cache
    pub cache_ttl: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ALPHA_VANTAGE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("ALPHA_VANTAGE_API_KEY"))?;

        let provider = ProviderConfig {
            api_key,
            base_url: lookup("ALPHA_VANTAGE_BASE_URL"),
            timeout: parse_or(&lookup, "STOCK_REQUEST_TIMEOUT_SECS", 30)?,
            rate_limit: Some(parse_or(&lookup, "ALPHA_VANTAGE_RATE_LIMIT", 5)?),
        };

        let llm_api_key = lookup("LLM_API_KEY")
            .or_else(|| lookup("OPENROUTER_API_KEY"))
            .unwrap_or_default();
        if llm_api_key.is_empty() {
            log::warn!("⚠️ No LLM_API_KEY or OPENROUTER_API_KEY set; narrative requests will be rejected");
        }

        let llm = LlmConfig {
            api_key: llm_api_key,
            base_url: lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let cache_secs: u64 = parse_or(&lookup, "STOCK_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;

        let history_window: usize =
            parse_or(&lookup, "HISTORY_WINDOW_DAYS", DEFAULT_HISTORY_WINDOW)?;
        if history_window == 0 {
            return Err(ConfigError::Invalid {
                name: "HISTORY_WINDOW_DAYS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            provider,
            llm,
            history_window,
            cache_ttl: (cache_secs > 0).then(|| Duration::from_secs(cache_secs)),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
