//! Error types and handling for the CLI
//!
//! Every failure maps to one of three exit codes: 1 for operation
//! failures (invalid payloads, unparsable replies), 2 for usage and
//! configuration problems, 3 for connectivity.

use recast_schemas::{LoaderError, SchemaError, ValidationFailure};
use std::io;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the pipeline library
    #[error("{0}")]
    Core(#[from] recast_core::Error),

    /// Schema rejected before any request was made
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Schema file could not be read or parsed
    #[error("{0}")]
    Loader(#[from] LoaderError),

    /// A payload failed validation
    #[error("{0}")]
    Invalid(#[from] ValidationFailure),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(core) => match core {
                recast_core::Error::Connectivity { .. } => 3,
                recast_core::Error::Unparsable { .. } => 1,
                recast_core::Error::Schema(_) => 2,
                recast_core::Error::Configuration { .. } => 2,
                recast_core::Error::Internal { .. } => 1,
            },
            Self::Invalid(_) => 1,
            Self::Io(_)
            | Self::Schema(_)
            | Self::Loader(_)
            | Self::Config(_)
            | Self::Json(_)
            | Self::Yaml(_) => 2,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_failure_class() {
        let connectivity = Error::Core(recast_core::Error::Connectivity {
            endpoint: "ollama at http://localhost:11434".to_string(),
            message: "connection refused".to_string(),
            source: None,
        });
        assert_eq!(connectivity.exit_code(), 3);

        let unparsable = Error::Core(recast_core::Error::Unparsable {
            attempts: 3,
            payload: "{broken".to_string(),
            failure: ValidationFailure::new("$", "expected a JSON object"),
        });
        assert_eq!(unparsable.exit_code(), 1);

        let invalid = Error::Invalid(ValidationFailure::new("$.city", "missing field"));
        assert_eq!(invalid.exit_code(), 1);

        assert_eq!(Error::config("bad base URL").exit_code(), 2);
    }

    #[test]
    fn plain_formatting_keeps_the_prefix() {
        let error = Error::config("unknown key");
        assert_eq!(
            format_error(&error, false),
            "Error: Configuration error: unknown key"
        );
    }
}
