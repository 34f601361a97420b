//! Recast Core - request pipeline for schema-validated model replies
//!
//! This crate turns prompts into validated JSON through a locally hosted
//! model: send the prompt, validate the reply against a response schema,
//! and transparently repair malformed replies with a secondary model
//! under a bounded attempt budget.
//!
//! # Main Components
//!
//! - **Endpoints**: the async boundary to a hosted model, with an Ollama
//!   implementation
//! - **Pipeline**: one prompt in, exactly one terminal outcome out
//! - **Repair**: bounded correction loop for malformed replies
//! - **Agents**: a trait layer for participants that hold prompts and
//!   consume validated responses
//! - **Tools**: declarative function calling over the same pipeline
//!
//! # Example
//!
//! ```no_run
//! use recast_core::{Pipeline, PipelineConfig, PromptRequest, Result};
//! use recast_schemas::{CompiledSchema, FieldSpec, FieldType, ResponseSchema};
//!
//! async fn example() -> Result<()> {
//!     let schema = CompiledSchema::compile(
//!         ResponseSchema::new("weather_report")
//!             .with_field(FieldSpec::new("city", FieldType::String))
//!             .with_field(FieldSpec::new("temp_f", FieldType::Number)),
//!     )?;
//!     let pipeline = Pipeline::from_config(PipelineConfig::default())?;
//!     let request = PromptRequest::new("What's the weather in Portland?");
//!     let report = pipeline.run(&request, &schema).await?;
//!     println!("{}", report.value());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod pipeline;
mod repair;
pub mod tools;

// Re-export main types for convenience
pub use error::{Error, Result};

pub use config::PipelineConfig;
pub use endpoint::{EndpointError, GenerateRequest, ModelEndpoint, OllamaEndpoint};
pub use pipeline::{Pipeline, PromptRequest};

pub use agent::{Agent, AgentRunner, DEFAULT_SYSTEM_PROMPT};
pub use tools::{
    ToolCallReport, ToolCallRequest, ToolDefinition, ToolHandler, ToolParameter, ToolRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
