//! Model endpoints: the async boundary to a hosted model
//!
//! A `ModelEndpoint` turns one generation request into raw reply text.
//! Everything above this boundary (validation, repair, agents) is transport
//! agnostic, which is also what makes the pipeline testable with scripted
//! in-memory endpoints.

pub mod ollama;

pub use ollama::OllamaEndpoint;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One generation request for a hosted model
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Model identifier, e.g. `qwen2.5:14b`
    pub model: String,
    /// The prompt body
    pub prompt: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// How long the server should keep the model loaded after answering
    pub keep_alive: Option<Duration>,
}

/// Transport-level failures from a model endpoint
///
/// Every variant can be constructed without a live connection, so test
/// doubles can exercise each failure mode.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// The endpoint could not be reached at all
    #[error("failed to reach {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },

    /// The request deadline elapsed before a reply arrived
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// The endpoint answered with a failure status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The reply body did not have the expected wire shape
    #[error("malformed reply from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    /// The invocation was cancelled mid-flight
    #[error("request to {endpoint} was cancelled")]
    Cancelled { endpoint: String },
}

impl EndpointError {
    /// The endpoint the failure came from
    pub fn endpoint(&self) -> &str {
        match self {
            EndpointError::Connect { endpoint, .. }
            | EndpointError::Timeout { endpoint }
            | EndpointError::Status { endpoint, .. }
            | EndpointError::Decode { endpoint, .. }
            | EndpointError::Cancelled { endpoint } => endpoint,
        }
    }
}

/// The async boundary to a hosted model
///
/// Implementations must be safe to share across concurrent invocations; the
/// pipeline holds them behind `Arc` and never serializes access.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Identifies the endpoint in errors and logs
    fn name(&self) -> &str;

    /// Send one generation request and return the raw reply text
    async fn generate(&self, request: &GenerateRequest) -> Result<String, EndpointError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accessor_covers_every_variant() {
        let errors = vec![
            EndpointError::Connect {
                endpoint: "a".to_string(),
                source: anyhow::anyhow!("refused"),
            },
            EndpointError::Timeout {
                endpoint: "b".to_string(),
            },
            EndpointError::Status {
                endpoint: "c".to_string(),
                status: 503,
                body: "overloaded".to_string(),
            },
            EndpointError::Decode {
                endpoint: "d".to_string(),
                detail: "missing field".to_string(),
            },
            EndpointError::Cancelled {
                endpoint: "e".to_string(),
            },
        ];
        let endpoints: Vec<&str> = errors.iter().map(|error| error.endpoint()).collect();
        assert_eq!(endpoints, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn display_names_the_failure_mode() {
        let err = EndpointError::Status {
            endpoint: "ollama at http://localhost:11434".to_string(),
            status: 404,
            body: "model not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ollama at http://localhost:11434 returned HTTP 404: model not found"
        );

        let err = EndpointError::Timeout {
            endpoint: "ollama at http://localhost:11434".to_string(),
        };
        assert!(err.to_string().contains("timed out"));
    }
}
