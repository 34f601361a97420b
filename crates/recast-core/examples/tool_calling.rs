//! A two-step tool-calling exchange: the model picks a tool, we run it,
//! and a follow-up prompt carries the invocation results back in.

use anyhow::anyhow;
use recast_core::{
    Pipeline, PipelineConfig, PromptRequest, Result, ToolDefinition, ToolParameter, ToolRegistry,
};
use recast_schemas::{CompiledSchema, FieldType, ResponseSchema};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut registry = ToolRegistry::new();
    registry.register(
        ToolDefinition::new("get_weather", "Look up current weather for a city").with_parameter(
            ToolParameter::new("city", FieldType::String).with_description("City name"),
        ),
        Box::new(|args| {
            let city = args["city"]
                .as_str()
                .ok_or_else(|| anyhow!("city must be a string"))?;
            Ok(json!({ "city": city, "temp_f": 54.2, "conditions": "light rain" }))
        }),
    );

    let schema = CompiledSchema::compile(registry.call_schema())?;
    let pipeline = Pipeline::from_config(PipelineConfig::from_env())?;

    let request = PromptRequest::new("What's the weather like in Portland right now?")
        .with_system(registry.system_prompt());
    let reply = pipeline.run(&request, &schema).await?;

    let reports = registry.dispatch_all(&reply);
    for report in &reports {
        println!("{} -> {:#}", report.call.function_name, report.outcome);
    }

    let summary_schema = CompiledSchema::compile(ResponseSchema::free_text())?;
    let request = PromptRequest::new("Summarize the weather for the user in one sentence.")
        .with_system(registry.system_prompt_with_history(&reports));
    let summary = pipeline.run(&request, &summary_schema).await?;
    println!("{}", summary.text().unwrap_or_default());

    Ok(())
}
