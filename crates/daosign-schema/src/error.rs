//! # Schema Errors
//!
//! Schema registration is a trust boundary. A rejected schema reports every
//! problem found, each with the path of the offending element, rather than
//! stopping at the first.

use std::fmt;

use daosign_core::{EncodingError, SchemaId};
use thiserror::Error;

/// Error raised by schema validation or lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema or its signatory policy is malformed.
    #[error("invalid schema '{name}':\n{violations}")]
    Invalid {
        /// The schema's metadata name.
        name: String,
        /// Every problem found.
        violations: Violations,
    },

    /// No schema is registered under this id.
    #[error("{0} not found")]
    NotFound(SchemaId),

    /// The schema could not be hashed.
    #[error("schema encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}

/// A single problem found in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path to the offending element (`policy.signatories[2]`).
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.path, self.message)
        }
    }
}

/// Collection of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether any violation sits under `path_prefix`.
    pub fn any_at(&self, path_prefix: &str) -> bool {
        self.violations.iter().any(|v| v.path.starts_with(path_prefix))
    }

    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub(crate) fn extend(&mut self, other: Violations) {
        self.violations.extend(other.violations);
    }

    pub(crate) fn into_result(self, name: &str) -> Result<(), SchemaError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Invalid {
                name: name.to_string(),
                violations: self,
            })
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
