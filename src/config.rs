use crate::processing::{ReductionMode, RetryPolicy};
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Default OpenAI-compatible endpoint exposed by Groq.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default model used for every summarization call.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BACKOFF_UNIT_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_ROUNDS: usize = 8;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the summarizer.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Credential sent as a bearer token to the provider.
    pub groq_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible chat completions API.
    pub groq_base_url: String,
    /// Model identifier passed to the provider.
    pub model: String,
    /// Total attempts allowed for a single external call.
    pub max_attempts: u32,
    /// Backoff time unit in milliseconds; retry `n` waits `unit * 2^n`.
    pub backoff_unit_ms: u64,
    /// HTTP timeout applied to each attempt.
    pub request_timeout_secs: u64,
    /// Number of chunk summaries requested in parallel.
    pub concurrency: usize,
    /// Re-chunk and reduce the intermediate document until it fits one chunk.
    pub recursive: bool,
    /// Upper bound on map rounds when `recursive` is enabled.
    pub max_rounds: usize,
    /// Optional path that receives a copy of the logs.
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit_ms: DEFAULT_BACKOFF_UNIT_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            concurrency: 1,
            recursive: false,
            max_rounds: DEFAULT_MAX_ROUNDS,
            log_file: None,
        }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replacement model identifier.
    pub model: Option<String>,
    /// Replacement attempt budget.
    pub max_attempts: Option<u32>,
    /// Replacement chunk concurrency.
    pub concurrency: Option<usize>,
    /// Force recursive reduction on.
    pub recursive: bool,
    /// Replacement round cap for recursive reduction.
    pub max_rounds: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            groq_api_key: load_env_optional("GROQ_API_KEY"),
            groq_base_url: load_env_optional("GROQ_BASE_URL").unwrap_or(defaults.groq_base_url),
            model: load_env_optional("DOCSUM_MODEL").unwrap_or(defaults.model),
            max_attempts: load_env_parsed("DOCSUM_MAX_ATTEMPTS")?
                .unwrap_or(defaults.max_attempts),
            backoff_unit_ms: load_env_parsed("DOCSUM_BACKOFF_UNIT_MS")?
                .unwrap_or(defaults.backoff_unit_ms),
            request_timeout_secs: load_env_parsed("DOCSUM_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
            concurrency: load_env_parsed("DOCSUM_CONCURRENCY")?.unwrap_or(defaults.concurrency),
            recursive: load_env_optional("DOCSUM_RECURSIVE")
                .map(|value| {
                    parse_flag(&value)
                        .ok_or_else(|| ConfigError::InvalidValue("DOCSUM_RECURSIVE".into()))
                })
                .transpose()?
                .unwrap_or(defaults.recursive),
            max_rounds: load_env_parsed("DOCSUM_MAX_ROUNDS")?.unwrap_or(defaults.max_rounds),
            log_file: load_env_optional("DOCSUM_LOG_FILE"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate the result.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(max_attempts) = overrides.max_attempts {
            self.max_attempts = max_attempts;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if overrides.recursive {
            self.recursive = true;
        }
        if let Some(max_rounds) = overrides.max_rounds {
            self.max_rounds = max_rounds;
        }
        self.validate()?;
        Ok(self)
    }

    /// Retry policy derived from the attempt budget and backoff unit.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_unit_ms))
    }

    /// Reduction mode selected by the `recursive` flag.
    pub fn reduction_mode(&self) -> ReductionMode {
        if self.recursive {
            ReductionMode::Recursive {
                max_rounds: self.max_rounds,
            }
        } else {
            ReductionMode::OnePass
        }
    }

    /// Per-attempt HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Record the effective settings; call once tracing is installed.
    pub fn log_loaded(&self) {
        tracing::debug!(
            base_url = %self.groq_base_url,
            model = %self.model,
            max_attempts = self.max_attempts,
            concurrency = self.concurrency,
            recursive = self.recursive,
            api_key_present = self.groq_api_key.is_some(),
            "Loaded configuration"
        );
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue("DOCSUM_MAX_ATTEMPTS".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue("DOCSUM_CONCURRENCY".into()));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::InvalidValue("DOCSUM_MAX_ROUNDS".into()));
        }
        Ok(())
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment, apply overrides, and install it in the global cache.
///
/// A second call returns the configuration installed by the first one.
pub fn init_config(overrides: ConfigOverrides) -> Result<&'static Config, ConfigError> {
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    dotenvy::dotenv().ok();
    let config = Config::from_env()?.with_overrides(overrides)?;
    Ok(CONFIG.get_or_init(|| config))
}
