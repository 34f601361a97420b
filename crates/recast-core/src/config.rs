//! Pipeline configuration
//!
//! Configuration is an explicit value handed to `Pipeline::new`, never global
//! state. The environment layer is opt-in: `from_env` reads a `.env` file and
//! `RECAST_*` variables over the defaults, and `apply_env_overrides` is
//! exposed separately so callers can layer files underneath the environment.

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::warn;

/// Default Ollama bind address
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model used when neither the request nor the environment names one
pub const DEFAULT_MODEL: &str = "qwen2.5:14b";

/// How long the server keeps the model loaded between exchanges
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(300);

/// Repair attempts before an exchange is declared unparsable
pub const DEFAULT_MAX_REPAIR_ATTEMPTS: u32 = 3;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for one pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Base URL of the model server
    pub base_url: String,
    /// Model answering primary prompts
    pub model: String,
    /// Model fixing malformed replies
    pub repair_model: String,
    /// Keep-alive passed through to the server
    pub keep_alive: Duration,
    /// Repair requests allowed per invocation; 0 disables repair
    pub max_repair_attempts: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            repair_model: DEFAULT_MODEL.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            max_repair_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    /// Defaults plus `.env` file plus `RECAST_*` environment variables
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply `RECAST_*` environment variables over the current values
    ///
    /// Unparsable numeric values are logged and ignored rather than
    /// escalated, so a stray variable cannot take the process down.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("RECAST_BASE_URL") {
            self.base_url = value;
        }
        if let Ok(value) = std::env::var("RECAST_MODEL") {
            self.model = value;
        }
        if let Ok(value) = std::env::var("RECAST_REPAIR_MODEL") {
            self.repair_model = value;
        }
        if let Ok(value) = std::env::var("RECAST_KEEP_ALIVE_SECS") {
            match value.parse::<f64>() {
                Ok(secs) if secs >= 0.0 && secs.is_finite() => {
                    self.keep_alive = Duration::from_secs_f64(secs);
                }
                _ => warn!("Invalid RECAST_KEEP_ALIVE_SECS value: {}", value),
            }
        }
        if let Ok(value) = std::env::var("RECAST_MAX_REPAIR_ATTEMPTS") {
            match value.parse::<u32>() {
                Ok(attempts) => self.max_repair_attempts = attempts,
                Err(_) => warn!("Invalid RECAST_MAX_REPAIR_ATTEMPTS value: {}", value),
            }
        }
        if let Ok(value) = std::env::var("RECAST_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.timeout = Duration::from_secs(secs),
                Err(_) => warn!("Invalid RECAST_TIMEOUT_SECS value: {}", value),
            }
        }
    }

    /// Set the base URL
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the primary model
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Set the repair model
    pub fn with_repair_model<S: Into<String>>(mut self, repair_model: S) -> Self {
        self.repair_model = repair_model.into();
        self
    }

    /// Set the keep-alive duration
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set the repair budget
    pub fn with_max_repair_attempts(mut self, attempts: u32) -> Self {
        self.max_repair_attempts = attempts;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject configurations that could not possibly work
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::configuration("base URL is empty"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::configuration("model name is empty"));
        }
        if self.repair_model.trim().is_empty() {
            return Err(Error::configuration("repair model name is empty"));
        }
        Ok(())
    }
}
