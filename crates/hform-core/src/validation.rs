//! The data-validation failure reported to callers.
//!
//! Validation failures are values, never `Err`s: a validation call returns a
//! `Vec<ValidationError>` in keyword-evaluation order. The form layer turns
//! each `path` into a nested error object; this crate never builds that
//! structure itself.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keyword::Keyword;
use crate::path::ErrorPath;

/// One reported constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Location of the offending value, relative to the validated root.
    pub path: ErrorPath,
    /// Keyword that failed.
    pub validation: Keyword,
    /// Default English description of the failure.
    pub message: String,
    /// The (effective) subschema that produced the failure.
    pub schema: Value,
    /// The offending value; `None` when the value is absent (e.g. `required`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Author-supplied message for `json-logic` failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_error_message: Option<String>,
}

impl ValidationError {
    pub fn new(path: ErrorPath, validation: Keyword, message: impl Into<String>) -> Self {
        Self {
            path,
            validation,
            message: message.into(),
            schema: Value::Bool(true),
            value: None,
            custom_error_message: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: &Value) -> Self {
        self.schema = schema.clone();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Option<&Value>) -> Self {
        self.value = value.cloned();
        self
    }

    #[must_use]
    pub fn with_custom_message(mut self, message: Option<String>) -> Self {
        self.custom_error_message = message;
        self
    }

    /// The message a user should see: the custom message when present,
    /// otherwise the default one.
    #[must_use]
    pub fn display_message(&self) -> &str {
        self.custom_error_message
            .as_deref()
            .unwrap_or(&self.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root) [{}]: {}", self.validation, self.display_message())
        } else {
            write!(
                f,
                "{} [{}]: {}",
                self.path,
                self.validation,
                self.display_message()
            )
        }
    }
}
