//! Response schema model: the declarative description of what a model reply
//! must look like
//!
//! A `ResponseSchema` is a named set of fields, each with a primitive or
//! nested type, an optional description, and an optional default. Schemas are
//! checked for well-formedness once, at configuration time, and then rendered
//! into a JSON Schema document for the validator and for repair prompts.
//!
//! Copyright (c) 2025 Recast Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Errors produced by the schema self-check and compilation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("schema name is empty")]
    UnnamedSchema,

    #[error("schema '{name}' declares no fields")]
    Empty { name: String },

    #[error("field at {path} has an empty name")]
    UnnamedField { path: String },

    #[error("duplicate field '{name}' at {path}")]
    DuplicateField { path: String, name: String },

    #[error("optional field {path} declares no default value")]
    MissingDefault { path: String },

    #[error("default value for {path} is not a valid {expected}: found {found}")]
    DefaultMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("schema '{name}' did not compile: {message}")]
    Compile { name: String, message: String },
}

/// The type of a single schema field
///
/// Serialized with a `type` tag, so a field spec reads naturally in YAML:
///
/// ```yaml
/// name: forecast
/// type: array
/// items:
///   type: string
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array { items: Box<FieldType> },
    Object { fields: Vec<FieldSpec> },
    /// An object with unconstrained members, for free-form dictionaries
    Map,
}

impl FieldType {
    /// Convenience constructor for array types
    pub fn array(items: FieldType) -> Self {
        FieldType::Array {
            items: Box::new(items),
        }
    }

    /// Convenience constructor for nested object types
    pub fn object(fields: Vec<FieldSpec>) -> Self {
        FieldType::Object { fields }
    }

    /// The JSON type name used in errors and rendered schemas
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array { .. } => "array",
            FieldType::Object { .. } => "object",
            FieldType::Map => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One field of a response schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it appears in the reply object
    pub name: String,
    /// Declared type
    #[serde(flatten)]
    pub kind: FieldType,
    /// Optional description, included in rendered schemas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the reply must contain this field (defaults to true)
    #[serde(default = "default_required")]
    pub required: bool,
    /// Value backfilled when an optional field is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    /// Create a required field
    pub fn new<N: Into<String>>(name: N, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            required: true,
            default: None,
        }
    }

    /// Attach a description
    pub fn with_description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the field optional with the value used when it is absent
    pub fn optional(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }
}

/// A named response schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Schema name, used in logs and rendered documents
    pub name: String,
    /// Optional description, included in rendered schemas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Top-level fields of the reply object
    pub fields: Vec<FieldSpec>,
}

impl ResponseSchema {
    /// Create an empty schema with the given name
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// The fallback schema for plain conversational replies: `{ text: string }`
    pub fn free_text() -> Self {
        Self::new("free_text")
            .describe("A plain text reply")
            .field("text", FieldType::String)
    }

    /// Attach a description
    pub fn describe<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required field
    pub fn field<N: Into<String>>(mut self, name: N, kind: FieldType) -> Self {
        self.fields.push(FieldSpec::new(name, kind));
        self
    }

    /// Add an optional field with its default
    pub fn optional_field<N: Into<String>>(
        mut self,
        name: N,
        kind: FieldType,
        default: Value,
    ) -> Self {
        self.fields.push(FieldSpec::new(name, kind).optional(default));
        self
    }

    /// Add a fully specified field
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Check the schema for well-formedness
    ///
    /// Rejects empty names, duplicate fields, optional fields without a
    /// default, and defaults whose JSON type contradicts the declared type.
    /// Paths in errors use `$.field.nested` notation, with `[]` for array
    /// elements.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::UnnamedSchema);
        }
        if self.fields.is_empty() {
            return Err(SchemaError::Empty {
                name: self.name.clone(),
            });
        }
        check_fields(&self.fields, "$")
    }

    /// Render the schema as a JSON Schema draft 2020-12 document
    pub fn to_json_schema(&self) -> Value {
        let mut document = serde_json::Map::new();
        document.insert(
            "$schema".to_string(),
            json!("https://json-schema.org/draft/2020-12/schema"),
        );
        document.insert("title".to_string(), json!(self.name));
        if let Some(description) = &self.description {
            document.insert("description".to_string(), json!(description));
        }
        if let Value::Object(body) = object_schema(&self.fields) {
            document.extend(body);
        }
        Value::Object(document)
    }
}

fn check_fields(fields: &[FieldSpec], path: &str) -> Result<(), SchemaError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for field in fields {
        if field.name.trim().is_empty() {
            return Err(SchemaError::UnnamedField {
                path: path.to_string(),
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                path: path.to_string(),
                name: field.name.clone(),
            });
        }
        let field_path = format!("{}.{}", path, field.name);
        if !field.required && field.default.is_none() {
            return Err(SchemaError::MissingDefault { path: field_path });
        }
        if let Some(default) = &field.default {
            if !value_matches(&field.kind, default) {
                return Err(SchemaError::DefaultMismatch {
                    path: field_path,
                    expected: field.kind.name().to_string(),
                    found: json_type_name(default).to_string(),
                });
            }
        }
        match &field.kind {
            FieldType::Object { fields } => check_fields(fields, &field_path)?,
            FieldType::Array { items } => check_items(items, &field_path)?,
            _ => {}
        }
    }
    Ok(())
}

fn check_items(kind: &FieldType, path: &str) -> Result<(), SchemaError> {
    let item_path = format!("{}[]", path);
    match kind {
        FieldType::Object { fields } => check_fields(fields, &item_path),
        FieldType::Array { items } => check_items(items, &item_path),
        _ => Ok(()),
    }
}

/// Whether a JSON value is acceptable for the given field type
pub(crate) fn value_matches(kind: &FieldType, value: &Value) -> bool {
    match kind {
        FieldType::String => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array { items } => match value.as_array() {
            Some(elements) => elements.iter().all(|element| value_matches(items, element)),
            None => false,
        },
        FieldType::Object { fields } => match value.as_object() {
            Some(map) => fields.iter().all(|field| match map.get(&field.name) {
                Some(entry) => value_matches(&field.kind, entry),
                None => !field.required,
            }),
            None => false,
        },
        FieldType::Map => value.is_object(),
    }
}

/// JSON type name of a value, matching the vocabulary of rendered schemas
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn object_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = serde_json::Map::new();
    for field in fields {
        let mut entry = match field_type_schema(&field.kind) {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("type".to_string(), other);
                map
            }
        };
        if let Some(description) = &field.description {
            entry.insert("description".to_string(), json!(description));
        }
        if let Some(default) = &field.default {
            entry.insert("default".to_string(), default.clone());
        }
        properties.insert(field.name.clone(), Value::Object(entry));
    }

    let required: Vec<&str> = fields
        .iter()
        .filter(|field| field.required)
        .map(|field| field.name.as_str())
        .collect();

    let mut schema = serde_json::Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    Value::Object(schema)
}

fn field_type_schema(kind: &FieldType) -> Value {
    match kind {
        FieldType::String => json!({"type": "string"}),
        FieldType::Integer => json!({"type": "integer"}),
        FieldType::Number => json!({"type": "number"}),
        FieldType::Boolean => json!({"type": "boolean"}),
        FieldType::Array { items } => json!({
            "type": "array",
            "items": field_type_schema(items),
        }),
        FieldType::Object { fields } => object_schema(fields),
        FieldType::Map => json!({"type": "object"}),
    }
}
