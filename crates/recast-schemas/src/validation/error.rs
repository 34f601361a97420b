//! Validation failure types for model replies
//!
//! Copyright (c) 2025 Recast Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single shaped problem found while checking a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Location of the problem in `$.field[0].nested` notation
    pub path: String,
    /// The rule that was broken: `syntax`, `required`, `type`, or `schema`
    pub rule: String,
    /// What the schema wanted
    pub expected: String,
    /// What the reply contained
    pub actual: String,
}

impl Violation {
    pub fn new<P, R, E, A>(path: P, rule: R, expected: E, actual: A) -> Self
    where
        P: Into<String>,
        R: Into<String>,
        E: Into<String>,
        A: Into<String>,
    {
        Self {
            path: path.into(),
            rule: rule.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: rule '{}' violated: expected {}, but found {}",
            self.path, self.rule, self.expected, self.actual
        )
    }
}

/// Why a reply was rejected
///
/// A recoverable value, not an escalated error: the pipeline feeds it to the
/// repair model, and it only reaches callers inside the terminal
/// repair-exhaustion error.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Location of the first problem
    pub path: String,
    /// Human-readable description of the first problem
    pub message: String,
    /// Every shaped problem found, up to a small cap
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed at '{}': {}", self.path, self.message)?;

        if self.violations.len() > 1 {
            write!(f, "\nviolations:")?;
            for violation in &self.violations {
                write!(f, "\n  - {}", violation)?;
            }
        }

        Ok(())
    }
}

impl ValidationFailure {
    /// Create a failure with a single violation
    pub fn new<P, M>(path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self {
            path: path.into(),
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Create a failure carrying shaped violations
    pub fn with_violations<P, M>(path: P, message: M, violations: Vec<Violation>) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self {
            path: path.into(),
            message: message.into(),
            violations,
        }
    }

    /// Failure for text that could not be parsed as JSON at all
    pub(crate) fn syntax(error: &serde_json::Error) -> Self {
        let message = error.to_string();
        let violation = Violation::new(
            "$",
            "syntax",
            "a well-formed JSON document",
            message.clone(),
        );
        Self::with_violations("$", message, vec![violation])
    }

    /// Whether the reply failed before any structural checking
    pub fn is_syntax(&self) -> bool {
        self.violations
            .first()
            .map(|violation| violation.rule == "syntax")
            .unwrap_or(false)
    }
}
