//! Schema inspection handlers

use crate::cli::{SchemaAction, SchemaArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use recast_schemas::CompiledSchema;
use tracing::instrument;

/// Handle the schema command
#[instrument(skip(args, _config, output))]
pub async fn handle_schema(
    args: SchemaArgs,
    _config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        SchemaAction::Check(file) => {
            let schema = recast_schemas::load_schema(&file.schema)?;
            let name = schema.name.clone();
            let field_count = schema.fields.len();
            CompiledSchema::compile(schema)?;
            output.success(&format!(
                "Schema '{}' is well formed ({} top-level fields)",
                name, field_count
            ))?;
            Ok(())
        }
        SchemaAction::Show(file) => {
            let schema = recast_schemas::load_schema(&file.schema)?;
            let compiled = CompiledSchema::compile(schema)?;
            output.data(compiled.json_schema())?;
            Ok(())
        }
    }
}
