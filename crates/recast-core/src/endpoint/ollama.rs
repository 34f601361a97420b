//! The Ollama generate endpoint
//!
//! Speaks the local Ollama HTTP API: `POST {base}/api/generate` with
//! `stream: false`, reading the reply text from the `response` field.

use crate::endpoint::{EndpointError, GenerateRequest, ModelEndpoint};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Cap on how much of a failure body is carried into errors
const MAX_ERROR_BODY: usize = 200;

/// A reqwest-backed endpoint for a local Ollama server
#[derive(Debug)]
pub struct OllamaEndpoint {
    client: reqwest::Client,
    generate_url: String,
    label: String,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<f64>,
}

#[derive(Deserialize)]
struct GenerateReply {
    response: String,
}

impl OllamaEndpoint {
    /// Create an endpoint for the server at `base_url`
    ///
    /// The URL is parsed eagerly so a bad address fails at configuration
    /// time, not on the first exchange.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| Error::Configuration {
            message: format!("invalid base URL '{}': {}", base_url, e),
            source: Some(anyhow::Error::new(e)),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::configuration(format!(
                "base URL '{}' must use http or https",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("failed to create HTTP client: {}", e),
                source: Some(anyhow::Error::new(e)),
            })?;

        let trimmed = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            generate_url: format!("{}/api/generate", trimmed),
            label: format!("ollama at {}", trimmed),
        })
    }

    fn classify(&self, error: reqwest::Error) -> EndpointError {
        if error.is_timeout() {
            EndpointError::Timeout {
                endpoint: self.label.clone(),
            }
        } else {
            EndpointError::Connect {
                endpoint: self.label.clone(),
                source: anyhow::Error::new(error),
            }
        }
    }
}

#[async_trait]
impl ModelEndpoint for OllamaEndpoint {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(&self, request: &GenerateRequest) -> std::result::Result<String, EndpointError> {
        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            keep_alive: request.keep_alive.map(|duration| duration.as_secs_f64()),
        };

        debug!(
            model = %request.model,
            prompt_bytes = request.prompt.len(),
            "sending generate request"
        );

        let response = self
            .client
            .post(&self.generate_url)
            .json(&body)
            .send()
            .await
            .map_err(|error| self.classify(error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndpointError::Status {
                endpoint: self.label.clone(),
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let reply: GenerateReply = response.json().await.map_err(|error| EndpointError::Decode {
            endpoint: self.label.clone(),
            detail: error.to_string(),
        })?;

        debug!(reply_bytes = reply.response.len(), "received generate reply");
        Ok(reply.response)
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{}...", head)
    }
}
