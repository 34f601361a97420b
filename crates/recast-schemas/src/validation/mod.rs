//! Reply validation: compiled schemas, lenient parsing, shaped failures
//!
//! Copyright (c) 2025 Recast Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod validator;

pub use error::{ValidationFailure, Violation};
pub use validator::CompiledSchema;
