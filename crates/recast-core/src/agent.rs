//! Agent adapter layer
//!
//! An `Agent` supplies prompts and consumes validated responses; an
//! `AgentRunner` drives one agent over a shared pipeline, one exchange per
//! tick. The agent never sees raw payloads, repair traffic, or transport
//! details, only the terminal outcome of each exchange.

use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, PromptRequest};
use recast_schemas::{CompiledSchema, ResponseSchema, ValidatedResponse};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// System prompt used by agents that do not provide their own
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly AI assistant.";

/// A conversational participant driven by the pipeline
pub trait Agent: Send {
    /// The prompt for the next exchange
    fn prompt(&self) -> String;

    /// The system prompt for the next exchange
    fn system_prompt(&self) -> String {
        DEFAULT_SYSTEM_PROMPT.to_string()
    }

    /// The schema replies must match; free text unless overridden
    fn response_schema(&self) -> ResponseSchema {
        ResponseSchema::free_text()
    }

    /// Overrides the pipeline's configured model for this agent
    fn model(&self) -> Option<String> {
        None
    }

    /// Receive a validated reply
    fn handle_response(&mut self, response: ValidatedResponse);

    /// Receive a failed exchange; logs a warning unless overridden
    fn handle_error(&mut self, error: &Error) {
        warn!(%error, "Agent exchange failed");
    }
}

/// Drives one agent over a pipeline
pub struct AgentRunner<A: Agent> {
    agent: A,
    pipeline: Arc<Pipeline>,
    schema: CompiledSchema,
}

impl<A: Agent> fmt::Debug for AgentRunner<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRunner")
            .field("pipeline", &self.pipeline)
            .field("schema", &self.schema.name())
            .finish_non_exhaustive()
    }
}

impl<A: Agent> AgentRunner<A> {
    /// Pair an agent with a pipeline, compiling its schema up front so a
    /// bad schema surfaces here instead of on the first tick
    pub fn new(agent: A, pipeline: Arc<Pipeline>) -> Result<Self> {
        let schema = CompiledSchema::compile(agent.response_schema())?;
        Ok(Self {
            agent,
            pipeline,
            schema,
        })
    }

    /// Run one full exchange and dispatch the outcome to the agent
    pub async fn tick(&mut self) -> Result<()> {
        let mut request =
            PromptRequest::new(self.agent.prompt()).with_system(self.agent.system_prompt());
        if let Some(model) = self.agent.model() {
            request = request.with_model(model);
        }
        match self.pipeline.run(&request, &self.schema).await {
            Ok(response) => {
                self.agent.handle_response(response);
                Ok(())
            }
            Err(error) => {
                self.agent.handle_error(&error);
                Err(error)
            }
        }
    }

    /// The driven agent
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Mutable access to the driven agent
    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    /// Release the agent
    pub fn into_agent(self) -> A {
        self.agent
    }
}
