//! The invocation surface
//!
//! A `Pipeline` owns two endpoint roles (primary and repair, usually the
//! same server) plus a config, and turns one prompt into exactly one
//! terminal outcome: a validated response, an unparsable error after the
//! repair budget is spent, or a connectivity error. It holds no per-run
//! state, so one pipeline can serve any number of concurrent invocations.

use crate::config::PipelineConfig;
use crate::endpoint::{GenerateRequest, ModelEndpoint, OllamaEndpoint};
use crate::error::Result;
use crate::repair::{repair, RepairOptions};
use recast_schemas::{CompiledSchema, ValidatedResponse};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// One prompt for the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    /// The prompt body
    pub prompt: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// Overrides the configured primary model for this request
    pub model: Option<String>,
}

impl PromptRequest {
    /// A request with no system prompt and the configured model
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model: None,
        }
    }

    /// Attach a system prompt
    pub fn with_system<S: Into<String>>(mut self, system: S) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Answer this request with a specific model
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Prompt in, validated response out
pub struct Pipeline {
    primary: Arc<dyn ModelEndpoint>,
    repair: Arc<dyn ModelEndpoint>,
    config: PipelineConfig,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("primary", &self.primary.name())
            .field("repair", &self.repair.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    /// Build a pipeline over explicit endpoints
    pub fn new(
        primary: Arc<dyn ModelEndpoint>,
        repair: Arc<dyn ModelEndpoint>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            primary,
            repair,
            config,
        })
    }

    /// Build a pipeline whose primary and repair roles share one Ollama
    /// endpoint derived from the config
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let endpoint: Arc<dyn ModelEndpoint> =
            Arc::new(OllamaEndpoint::new(&config.base_url, config.timeout)?);
        Ok(Self {
            primary: Arc::clone(&endpoint),
            repair: endpoint,
            config,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one invocation to its terminal outcome
    ///
    /// The primary model answers first; a reply that validates returns
    /// without any repair traffic. A malformed reply goes through the
    /// bounded repair loop. Transport failures surface immediately, and
    /// dropping the returned future abandons the invocation.
    pub async fn run(
        &self,
        request: &PromptRequest,
        schema: &CompiledSchema,
    ) -> Result<ValidatedResponse> {
        let invocation = format!("req_{}", Uuid::new_v4().simple());
        let span = info_span!("invocation", id = %invocation, schema = schema.name());
        self.run_inner(request, schema).instrument(span).await
    }

    async fn run_inner(
        &self,
        request: &PromptRequest,
        schema: &CompiledSchema,
    ) -> Result<ValidatedResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        debug!(
            model = %model,
            endpoint = self.primary.name(),
            "Sending primary generate request"
        );
        let generate = GenerateRequest {
            model,
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            keep_alive: Some(self.config.keep_alive),
        };
        let payload = self.primary.generate(&generate).await?;

        match schema.validate(&payload) {
            Ok(validated) => {
                debug!(schema = schema.name(), "Reply validated on the first pass");
                Ok(validated)
            }
            Err(failure) => {
                debug!(error = %failure, "Primary reply failed validation, repairing");
                let options = RepairOptions {
                    model: self.config.repair_model.clone(),
                    keep_alive: Some(self.config.keep_alive),
                    max_attempts: self.config.max_repair_attempts,
                };
                repair(self.repair.as_ref(), &options, schema, payload, failure).await
            }
        }
    }
}
