//! Error types for the recast core library
//!
//! One invocation of the pipeline ends in exactly one of three ways: a
//! validated response, a connectivity error, or an unparsable-response error.
//! Everything else here covers configuration time. Errors are defined with
//! thiserror; anyhow carries underlying causes where one exists.

use crate::endpoint::EndpointError;
use recast_schemas::{SchemaError, ValidationFailure};
use thiserror::Error;

/// Main error type for recast operations
#[derive(Error, Debug)]
pub enum Error {
    /// The model endpoint could not be reached, timed out, answered with a
    /// failure status, or the invocation was cancelled. Never retried.
    #[error("Connectivity error: {endpoint} - {message}")]
    Connectivity {
        endpoint: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The repair budget ran out without producing a conformant reply.
    /// Carries the most recent payload and the failure that rejected it.
    #[error("Unparsable response after {attempts} repair attempt(s): {failure}")]
    Unparsable {
        attempts: u32,
        payload: String,
        failure: ValidationFailure,
    },

    /// A response schema was rejected while configuring a pipeline or agent
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Invalid construction parameters
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error from a plain message
    pub fn configuration<M: Into<String>>(message: M) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }
}

impl From<EndpointError> for Error {
    fn from(err: EndpointError) -> Self {
        Error::Connectivity {
            endpoint: err.endpoint().to_string(),
            message: err.to_string(),
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
