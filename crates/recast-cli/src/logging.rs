//! Logging configuration for the CLI
//!
//! Verbosity flags map onto tracing levels. `RUST_LOG` wins over the
//! derived level when set, and logs go to stderr so formatted results
//! on stdout stay machine-readable.

use crate::error::{Error, Result};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line output
    Compact,
    /// Multi-line output with full span context
    Full,
    /// Newline-delimited JSON
    Json,
}

/// Settings for the tracing subscriber
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Base level filter, e.g. `warn` or `recast_core=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include file and line of the event site
    pub show_source_location: bool,
    /// Include thread ids
    pub show_thread_ids: bool,
}

impl LoggingConfig {
    /// Derive settings from the number of `-v` flags
    pub fn from_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => Self {
                level: "warn".to_string(),
                format: LogFormat::Compact,
                show_source_location: false,
                show_thread_ids: false,
            },
            1 => Self {
                level: "info".to_string(),
                format: LogFormat::Compact,
                show_source_location: false,
                show_thread_ids: false,
            },
            2 => Self {
                level: "debug".to_string(),
                format: LogFormat::Compact,
                show_source_location: true,
                show_thread_ids: false,
            },
            _ => Self {
                level: "trace".to_string(),
                format: LogFormat::Full,
                show_source_location: true,
                show_thread_ids: true,
            },
        }
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        if let Ok(format) = std::env::var("RECAST_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "compact" => self.format = LogFormat::Compact,
                "full" => self.format = LogFormat::Full,
                "json" => self.format = LogFormat::Json,
                other => eprintln!("Warning: unknown RECAST_LOG_FORMAT value: {}", other),
            }
        }
    }
}

/// Initialize the global tracing subscriber
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_file(config.show_source_location)
        .with_line_number(config.show_source_location)
        .with_thread_ids(config.show_thread_ids);

    let initialized = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Full => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    initialized.map_err(|e| Error::config(format!("failed to initialize logging: {e}")))
}
