//! Application configuration.
//!
//! Settings are read from environment variables with the `NHL_ASSISTANT`
//! prefix (`__` separated) after loading an optional `.env` file. Every
//! field has a default, so an empty environment yields a usable
//! configuration apart from the API key.
//!
//! # Example
//!
//! ```no_run
//! use nhl_assistant::config::Settings;
//!
//! let settings = Settings::load().expect("Failed to load configuration");
//! settings.validate().expect("Invalid configuration");
//! println!("Using model {}", settings.model);
//! ```

mod error;

pub use error::{ConfigError, ValidationError};

use std::time::Duration;

use serde::Deserialize;

use crate::agents::executor::{ExecutionMode, DEFAULT_MAX_ITERATIONS};
use crate::chat::history::DEFAULT_HISTORY_TURNS;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "NHL_ASSISTANT";

pub const DEFAULT_MODEL: &str = "gemma-3-27b-it";
pub const DEFAULT_DATABASE_PATH: &str = "data/nhl_stats.db";
pub const DEFAULT_NHL_STATS_BASE_URL: &str = "https://api.nhle.com/stats/rest";

/// Unprefixed variables honoured for the API key.
const API_KEY_FALLBACKS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Google Generative Language API key.
    pub google_api_key: Option<String>,
    /// Oracle model name.
    pub model: String,
    /// SQLite statistics database.
    pub database_path: String,
    /// Root of the public NHL stats REST API.
    pub nhl_stats_base_url: String,
    /// Decide/execute rounds per question in multi-step mode.
    pub max_iterations: usize,
    /// Run one decide/execute round per question.
    pub single_shot: bool,
    /// Conversation turns shown to the oracle.
    pub history_turns: usize,
    /// HTTP server port.
    pub port: u16,
    /// Timeout for every outbound HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            google_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            nhl_stats_base_url: DEFAULT_NHL_STATS_BASE_URL.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            single_shot: false,
            history_turns: DEFAULT_HISTORY_TURNS,
            port: 8080,
            request_timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Load configuration from the process environment
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `NHL_ASSISTANT` prefix
    /// 3. Falls back to `GOOGLE_API_KEY` / `GEMINI_API_KEY` for the key
    ///
    /// # Environment Variable Format
    ///
    /// - `NHL_ASSISTANT__MODEL=gemini-2.0-flash` -> `model = "gemini-2.0-flash"`
    /// - `NHL_ASSISTANT__MAX_ITERATIONS=5` -> `max_iterations = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let vars: config::Map<String, String> = vars.into_iter().collect();
        let fallback_key = API_KEY_FALLBACKS
            .iter()
            .filter_map(|name| vars.get(*name))
            .find(|v| !v.trim().is_empty())
            .cloned();

        let mut settings: Settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars)),
            )
            .build()?
            .try_deserialize()?;

        settings.google_api_key = settings
            .google_api_key
            .filter(|k| !k.trim().is_empty())
            .or(fallback_key);
        Ok(settings)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::EmptyModel);
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::ZeroIterations);
        }
        if self.history_turns == 0 {
            return Err(ValidationError::ZeroHistoryTurns);
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !self.nhl_stats_base_url.starts_with("http://")
            && !self.nhl_stats_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidStatsUrl);
        }
        Ok(())
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.single_shot {
            ExecutionMode::SingleShot
        } else {
            ExecutionMode::MultiStep {
                max_iterations: self.max_iterations,
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
