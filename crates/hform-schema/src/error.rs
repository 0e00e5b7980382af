//! Schema-authoring errors.

use hform_logic::LogicError;
use thiserror::Error;

/// A mistake in the schema itself. Data failures are never reported
/// through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A rule, registry, or rule reference is broken.
    #[error(transparent)]
    Logic(#[from] LogicError),

    /// The schema (or a subschema) could not be read.
    #[error("invalid schema at '{location}': {reason}")]
    InvalidSchema { location: String, reason: String },

    /// Schema nesting went past `max_depth`.
    #[error("schema nesting exceeds the maximum depth of {depth}")]
    DepthExceeded { depth: usize },
}

impl SchemaError {
    pub(crate) fn invalid(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidSchema {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}
