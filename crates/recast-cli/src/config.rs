//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables
//! - Command-line arguments
//!
//! Later layers win, so flags beat the environment which beats the file.

use crate::cli::AskArgs;
use crate::error::{Error, Result};
use recast_core::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values a configuration file may set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the model server
    pub base_url: Option<String>,

    /// Model answering primary prompts
    pub model: Option<String>,

    /// Model fixing malformed replies
    pub repair_model: Option<String>,

    /// Keep-alive in seconds
    pub keep_alive_secs: Option<u64>,

    /// Repair budget per invocation
    pub max_repair_attempts: Option<u32>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|s| s.to_str());
        let config = if extension == Some("yaml") || extension == Some("yml") {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            if !path.exists() {
                return Err(Error::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Current directory
        paths.push(PathBuf::from(".recast.yaml"));
        paths.push(PathBuf::from(".recast.json"));

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let recast_dir = config_dir.join("recast");
            paths.push(recast_dir.join("config.yaml"));
            paths.push(recast_dir.join("config.json"));
        }

        // Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".recast.yaml"));
            paths.push(home_dir.join(".recast.json"));
        }

        paths
    }

    /// Resolve the pipeline configuration for one invocation
    pub fn resolve_pipeline(&self, args: &AskArgs) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(repair_model) = &self.repair_model {
            config.repair_model = repair_model.clone();
        }
        if let Some(secs) = self.keep_alive_secs {
            config.keep_alive = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_repair_attempts {
            config.max_repair_attempts = attempts;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }

        config.apply_env_overrides();

        if let Some(base_url) = &args.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(model) = &args.model {
            config.model = model.clone();
        }
        if let Some(repair_model) = &args.repair_model {
            config.repair_model = repair_model.clone();
        }
        if let Some(secs) = args.keep_alive_secs {
            config.keep_alive = Duration::from_secs(secs);
        }
        if let Some(attempts) = args.max_repair_attempts {
            config.max_repair_attempts = attempts;
        }
        if let Some(secs) = args.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }

        config
    }
}
