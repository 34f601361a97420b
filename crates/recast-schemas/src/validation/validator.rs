//! Compiled schemas and the reply validation pass
//!
//! Validation is pure: it takes the raw reply text and produces either a
//! `ValidatedResponse` or a `ValidationFailure`. Replies are parsed leniently
//! (models habitually wrap JSON in prose or Markdown fences), checked against
//! the compiled JSON Schema document, and then filled in with declared
//! defaults for absent optional fields.
//!
//! Copyright (c) 2025 Recast Team
//! Licensed under the Apache-2.0 license

use crate::response::ValidatedResponse;
use crate::schema::{json_type_name, FieldSpec, FieldType, ResponseSchema, SchemaError};
use crate::validation::error::{ValidationFailure, Violation};
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{ValidationError, Validator};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// Cap on the number of shaped violations carried by one failure
const MAX_VIOLATIONS: usize = 8;

static FENCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn fence_regex() -> &'static Regex {
    FENCE_REGEX.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap())
}

/// A response schema compiled for repeated validation
///
/// Compilation runs the schema self-check and builds the JSON Schema
/// validator once, so every malformed schema is rejected at configuration
/// time rather than in the middle of a model exchange.
pub struct CompiledSchema {
    schema: ResponseSchema,
    document: Value,
    validator: Validator,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Check and compile a schema
    pub fn compile(schema: ResponseSchema) -> Result<Self, SchemaError> {
        schema.check()?;
        let document = schema.to_json_schema();
        let validator =
            jsonschema::validator_for(&document).map_err(|error| SchemaError::Compile {
                name: schema.name.clone(),
                message: error.to_string(),
            })?;
        Ok(Self {
            schema,
            document,
            validator,
        })
    }

    /// The schema this validator was compiled from
    pub fn schema(&self) -> &ResponseSchema {
        &self.schema
    }

    /// The schema's name
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// The rendered JSON Schema document
    pub fn json_schema(&self) -> &Value {
        &self.document
    }

    /// Validate a raw reply
    ///
    /// Deterministic and side-effect free: the same input always produces
    /// the same outcome, and arbitrary garbage input produces a failure
    /// value rather than a panic.
    pub fn validate(&self, raw: &str) -> Result<ValidatedResponse, ValidationFailure> {
        let mut value = parse_payload(raw)?;

        let mut first_message: Option<String> = None;
        let mut violations = Vec::new();
        for error in self.validator.iter_errors(&value) {
            if first_message.is_none() {
                first_message = Some(error.to_string());
            }
            violations.push(shape_violation(&error));
            if violations.len() >= MAX_VIOLATIONS {
                break;
            }
        }
        if let Some(message) = first_message {
            let path = violations[0].path.clone();
            return Err(ValidationFailure::with_violations(path, message, violations));
        }

        apply_defaults(&self.schema.fields, &mut value);
        Ok(ValidatedResponse::from_validated(
            self.schema.name.clone(),
            value,
        ))
    }
}

/// Parse the reply text, falling back to lenient extraction
///
/// Reported positions always refer to the parse of the original text, so
/// line and column numbers match what the model actually sent.
fn parse_payload(raw: &str) -> Result<Value, ValidationFailure> {
    let error = match serde_json::from_str(raw) {
        Ok(value) => return Ok(value),
        Err(error) => error,
    };

    for candidate in extraction_candidates(raw) {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
    }

    Err(ValidationFailure::syntax(&error))
}

/// Substrings of the reply worth attempting to parse on their own
fn extraction_candidates(raw: &str) -> Vec<&str> {
    let mut candidates = Vec::new();

    if let Some(captures) = fence_regex().captures(raw) {
        if let Some(fenced) = captures.get(1) {
            candidates.push(fenced.as_str());
        }
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            candidates.push(&raw[start..=end]);
        }
    }

    candidates
}

fn shape_violation(error: &ValidationError<'_>) -> Violation {
    let instance_path = pointer_to_path(&error.instance_path.to_string());
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            let path = if instance_path == "$" {
                format!("$.{}", name)
            } else {
                format!("{}.{}", instance_path, name)
            };
            Violation::new(
                path,
                "required",
                format!("field \"{}\" to be present", name),
                "missing",
            )
        }
        ValidationErrorKind::Type { kind } => {
            let expected = match kind {
                TypeKind::Single(primitive) => primitive.to_string(),
                TypeKind::Multiple(_) => "one of the permitted types".to_string(),
            };
            Violation::new(
                instance_path,
                "type",
                expected,
                format!(
                    "{} ({})",
                    json_type_name(&error.instance),
                    snippet(&error.instance)
                ),
            )
        }
        _ => Violation::new(
            instance_path,
            "schema",
            "a value satisfying the schema",
            error.to_string(),
        ),
    }
}

/// Convert a JSON pointer to `$.field[0].nested` notation
fn pointer_to_path(pointer: &str) -> String {
    if pointer.is_empty() {
        return "$".to_string();
    }
    let mut path = String::from("$");
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path.push('.');
            path.push_str(&segment);
        }
    }
    path
}

/// Short rendering of an offending value for error text
fn snippet(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= 60 {
        rendered
    } else {
        let head: String = rendered.chars().take(60).collect();
        format!("{}...", head)
    }
}

/// Backfill declared defaults for absent optional fields, recursively
fn apply_defaults(fields: &[FieldSpec], value: &mut Value) {
    let map = match value {
        Value::Object(map) => map,
        _ => return,
    };
    for field in fields {
        match map.get_mut(&field.name) {
            Some(existing) => descend_defaults(&field.kind, existing),
            None => {
                if let Some(default) = &field.default {
                    let mut value = default.clone();
                    descend_defaults(&field.kind, &mut value);
                    map.insert(field.name.clone(), value);
                }
            }
        }
    }
}

fn descend_defaults(kind: &FieldType, value: &mut Value) {
    match kind {
        FieldType::Object { fields } => apply_defaults(fields, value),
        FieldType::Array { items } => {
            if let Value::Array(elements) = value {
                for element in elements {
                    descend_defaults(items, element);
                }
            }
        }
        _ => {}
    }
}
