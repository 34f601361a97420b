//! Recast Schemas - response schema model and reply validation
//!
//! This crate owns the declarative side of recast:
//! - **ResponseSchema**: named field sets describing what a model reply must
//!   look like, with defaults for optional fields
//! - **CompiledSchema**: schemas checked and compiled once at configuration
//!   time, then reused for every exchange
//! - **Lenient parsing**: replies wrapped in prose or Markdown fences are
//!   extracted before structural checking
//! - **Shaped failures**: every rejection carries a `$.path`, a message, and
//!   rule-level violations suitable for repair prompts and terminals
//!
//! ## Quick Start
//!
//! ```rust
//! use recast_schemas::{CompiledSchema, FieldType, ResponseSchema};
//!
//! let schema = ResponseSchema::new("weather_report")
//!     .field("city", FieldType::String)
//!     .field("temp_f", FieldType::Number);
//!
//! let compiled = CompiledSchema::compile(schema).unwrap();
//!
//! let reply = compiled
//!     .validate(r#"{"city": "Portland", "temp_f": 54.5}"#)
//!     .unwrap();
//! assert_eq!(reply.value()["city"], "Portland");
//!
//! let failure = compiled.validate(r#"{"city": "Portland"}"#).unwrap_err();
//! assert_eq!(failure.path, "$.temp_f");
//! ```
//!
//! Copyright (c) 2025 Recast Team
//! Licensed under the Apache-2.0 license

pub mod loader;
pub mod response;
pub mod schema;
pub mod validation;

pub use loader::{load_schema, LoaderError, LoaderResult};
pub use response::ValidatedResponse;
pub use schema::{FieldSpec, FieldType, ResponseSchema, SchemaError};
pub use validation::{CompiledSchema, ValidationFailure, Violation};
