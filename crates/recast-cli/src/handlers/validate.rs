//! Validate command handler

use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use recast_schemas::CompiledSchema;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, instrument};

/// Handle the validate command
#[instrument(skip(args, _config, output), fields(schema = %args.schema.display()))]
pub async fn handle_validate(
    args: ValidateArgs,
    _config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let schema = recast_schemas::load_schema(&args.schema)?;
    let compiled = CompiledSchema::compile(schema)?;

    let payload = read_payload(args.payload.as_deref())?;
    debug!(bytes = payload.len(), "Validating payload");

    match compiled.validate(&payload) {
        Ok(response) => {
            output.success(&format!(
                "Payload matches schema '{}'",
                response.schema_name()
            ))?;
            if output.format() != OutputFormat::Human {
                output.data(response.value())?;
            }
            Ok(())
        }
        Err(failure) => {
            output.failure(&failure)?;
            Err(Error::Invalid(failure))
        }
    }
}

fn read_payload(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(fs::read_to_string(path)?),
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
