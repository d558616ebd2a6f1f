use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Deployment environment
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Service configuration, read from environment variables.
///
/// Every field maps to the upper-cased variable of the same name (`CHAT_MODEL`,
/// `MAX_UPLOAD_BYTES`, ...). Only `CHAT_API_KEY` has no default, and it is optional:
/// clients normally send their own bearer token.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated list of origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
    #[serde(default = "default_chat_completions_url")]
    pub chat_completions_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
    /// Token used when a request carries none
    #[serde(default)]
    pub chat_api_key: Option<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Longest source text sent to the model, in characters
    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,
    #[serde(default = "default_draft_ttl_minutes")]
    pub draft_ttl_minutes: i64,
    #[serde(default = "default_draft_sweep_interval_secs")]
    pub draft_sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> String {
    "http://localhost:5173".to_string()
}

fn default_chat_completions_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_chat_temperature() -> f32 {
    0.7
}

const fn default_chat_timeout_secs() -> u64 {
    120
}

const fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

const fn default_max_source_chars() -> usize {
    16_000
}

const fn default_draft_ttl_minutes() -> i64 {
    120
}

const fn default_draft_sweep_interval_secs() -> u64 {
    300
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = envy::from_env::<Self>()?;
        // An empty variable means "unset"
        if config
            .chat_api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            config.chat_api_key = None;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values the background jobs cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.draft_sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "DRAFT_SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        self.draft_ttl()?;
        Ok(())
    }

    /// How long a draft may sit untouched before it is evicted.
    pub fn draft_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if self.draft_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "DRAFT_TTL_MINUTES must be greater than zero".to_string(),
            ));
        }
        chrono::Duration::try_minutes(self.draft_ttl_minutes).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "DRAFT_TTL_MINUTES is too large: {}",
                self.draft_ttl_minutes
            ))
        })
    }

    pub const fn draft_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.draft_sweep_interval_secs)
    }

    /// Allowed CORS origins, trimmed, without empty entries.
    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            chat_completions_url: default_chat_completions_url(),
            chat_model: default_chat_model(),
            chat_temperature: default_chat_temperature(),
            chat_timeout_secs: default_chat_timeout_secs(),
            chat_api_key: None,
            max_upload_bytes: default_max_upload_bytes(),
            max_source_chars: default_max_source_chars(),
            draft_ttl_minutes: default_draft_ttl_minutes(),
            draft_sweep_interval_secs: default_draft_sweep_interval_secs(),
        }
    }
}
