//! Ask command handler

use crate::cli::{AskArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use recast_core::{Pipeline, PromptRequest};
use recast_schemas::{CompiledSchema, ResponseSchema};
use serde_json::json;
use std::fs;
use tracing::{debug, info, instrument};

/// Handle the ask command
#[instrument(skip(args, config, output), fields(schema = ?args.schema))]
pub async fn handle_ask(args: AskArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let schema = match &args.schema {
        Some(path) => recast_schemas::load_schema(path)?,
        None => ResponseSchema::free_text(),
    };
    debug!(schema = %schema.name, "Compiling response schema");
    let compiled = CompiledSchema::compile(schema)?;

    let pipeline_config = config.resolve_pipeline(&args);
    info!(
        base_url = %pipeline_config.base_url,
        model = %pipeline_config.model,
        "Sending prompt"
    );
    let pipeline = Pipeline::from_config(pipeline_config)?;

    let mut request = PromptRequest::new(args.prompt.clone());
    if let Some(system) = &args.system {
        request = request.with_system(system.clone());
    }

    let pb = output.spinner("Waiting for the model...");
    let outcome = pipeline.run(&request, &compiled).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match outcome {
        Ok(response) => {
            output.data(response.value())?;
            if let Some(path) = &args.save_to {
                fs::write(path, serde_json::to_string_pretty(response.value())?)?;
                output.success(&format!("Saved validated reply to {}", path.display()))?;
            }
            Ok(())
        }
        Err(recast_core::Error::Unparsable {
            attempts,
            payload,
            failure,
        }) => {
            if output.format() == OutputFormat::Human {
                output.error(&format!(
                    "Reply still malformed after {} repair attempt(s)",
                    attempts
                ))?;
                output.failure(&failure)?;
                output.section("Final payload")?;
                output.writeln(&payload)?;
            } else {
                output.data(&json!({
                    "attempts": attempts,
                    "failure": &failure,
                    "payload": &payload,
                }))?;
            }
            Err(Error::Core(recast_core::Error::Unparsable {
                attempts,
                payload,
                failure,
            }))
        }
        Err(e) => Err(e.into()),
    }
}
