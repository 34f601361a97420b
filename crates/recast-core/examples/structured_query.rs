//! Ask a local model for a structured character sheet.
//!
//! Needs a running Ollama server; point `RECAST_BASE_URL` elsewhere if
//! yours is not on localhost.

use recast_core::{Pipeline, PipelineConfig, PromptRequest, Result};
use recast_schemas::{CompiledSchema, FieldType, ResponseSchema};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let schema = CompiledSchema::compile(
        ResponseSchema::new("rpg_character")
            .describe("A playable character sheet")
            .field("name", FieldType::String)
            .field("class", FieldType::String)
            .field("level", FieldType::Integer)
            .optional_field("backstory", FieldType::String, json!("")),
    )?;

    let pipeline = Pipeline::from_config(PipelineConfig::from_env())?;
    let request = PromptRequest::new(
        "Create a level 3 dungeon crawler character with a short backstory.",
    );

    let character = pipeline.run(&request, &schema).await?;
    println!("{:#}", character.value());
    Ok(())
}
