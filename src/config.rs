//! Runtime configuration.
//!
//! All values are plain; nothing is discovered dynamically. [`ClientConfig::from_env`]
//! reads the variables below, falling back to the defaults for anything unset:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `OPENAI_API_KEY` | none |
//! | `OPENAI_BASE_URL` | `https://api.openai.com` |
//! | `OPENAI_MODEL` | `deepseek-chat` |
//! | `NOVEL_DATAGEN_MAX_RETRIES` | 5 |
//! | `NOVEL_DATAGEN_RETRY_DELAY_MS` | 1000 |
//! | `NOVEL_DATAGEN_TIMEOUT_SECS` | 60 |
//! | `NOVEL_DATAGEN_CONCURRENCY` | 50 |
//! | `NOVEL_DATAGEN_TEMPERATURE` | 0.7 |
//! | `NOVEL_DATAGEN_SEED` | none |

use crate::batch::DEFAULT_CONCURRENCY_LIMIT;
use crate::client::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::protocol::DEFAULT_TEMPERATURE;
use crate::transport::DEFAULT_TIMEOUT;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub temperature: f64,
    pub seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            concurrency: DEFAULT_CONCURRENCY_LIMIT,
            temperature: DEFAULT_TEMPERATURE,
            seed: None,
        }
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("temperature", &self.temperature)
            .field("seed", &self.seed)
            .finish()
    }
}

impl ClientConfig {
    /// Read the environment. Only parse errors are reported here; call
    /// [`validate`](Self::validate) once any overrides have been applied.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = env_string("OPENAI_API_KEY") {
            cfg.api_key = Some(v);
        }
        if let Some(v) = env_string("OPENAI_BASE_URL") {
            cfg.base_url = v;
        }
        if let Some(v) = env_string("OPENAI_MODEL") {
            cfg.model = v;
        }
        if let Some(v) = env_parse("NOVEL_DATAGEN_MAX_RETRIES")? {
            cfg.max_retries = v;
        }
        if let Some(v) = env_parse("NOVEL_DATAGEN_RETRY_DELAY_MS")? {
            cfg.retry_delay_ms = v;
        }
        if let Some(v) = env_parse("NOVEL_DATAGEN_TIMEOUT_SECS")? {
            cfg.timeout_secs = v;
        }
        if let Some(v) = env_parse("NOVEL_DATAGEN_CONCURRENCY")? {
            cfg.concurrency = v;
        }
        if let Some(v) = env_parse("NOVEL_DATAGEN_TEMPERATURE")? {
            cfg.temperature = v;
        }
        if let Some(v) = env_parse("NOVEL_DATAGEN_SEED")? {
            cfg.seed = Some(v);
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new().with_field_path("model"),
            ));
        }
        if self.concurrency == 0 {
            return Err(Error::configuration_with_context(
                "concurrency limit must be at least 1",
                ErrorContext::new().with_field_path("concurrency"),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::configuration_with_context(
                format!("temperature {} is outside 0.0..=2.0", self.temperature),
                ErrorContext::new().with_field_path("temperature"),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_string(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot parse '{}': {}", raw, e),
                ErrorContext::new()
                    .with_field_path(name)
                    .with_source("env"),
            )
        }),
    }
}
