//! Loading response schemas from YAML and JSON files
//!
//! Copyright (c) 2025 Recast Team
//! Licensed under the Apache-2.0 license

use crate::schema::ResponseSchema;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised while reading schema files
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML file '{path}': {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON file '{path}': {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unsupported file format for '{path}'. Expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: PathBuf },
}

/// Supported schema file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> LoaderResult<Self> {
        match path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(LoaderError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Read a response schema from a file, detecting format from the extension
pub fn load_schema<P: AsRef<Path>>(path: P) -> LoaderResult<ResponseSchema> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&content, format, path)
}

/// Parse schema content in an explicit format
pub fn parse_schema(content: &str, format: Format, path: &Path) -> LoaderResult<ResponseSchema> {
    match format {
        Format::Yaml => serde_yaml::from_str(content).map_err(|source| LoaderError::YamlParse {
            path: path.to_path_buf(),
            source,
        }),
        Format::Json => serde_json::from_str(content).map_err(|source| LoaderError::JsonParse {
            path: path.to_path_buf(),
            source,
        }),
    }
}
