//! # hform-schema
//!
//! Validates JSON values against JSON-Schema-style schemas extended with
//! rule-driven attributes.
//!
//! A call runs in two passes:
//!
//! 1. [`augment`] builds the *effective schema* for the data: conditional
//!    branches are merged and `logic-computedAttrs` are replaced by their
//!    computed values.
//! 2. [`validate`] checks the data against the effective schema and returns
//!    every failure as a [`ValidationError`], in keyword-evaluation order.
//!
//! Data failures are returned as values. Mistakes in the schema itself
//! (broken rules, unknown rule names, invalid patterns) are
//! `Err(`[`SchemaError`]`)` and abort the call.
//!
//! ```
//! use hform_schema::{ValidationOptions, validate_schema};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "field_a": {"type": "number"},
//!         "field_b": {"type": "number", "logic-validations": ["a_greater_than_field_b"]}
//!     },
//!     "logic": {"validations": {"a_greater_than_field_b": {
//!         "rule": {">": [{"var": "field_a"}, {"var": "field_b"}]},
//!         "errorMessage": "Must be greater than field_a"
//!     }}}
//! });
//!
//! let errors = validate_schema(&json!({"field_a": 1, "field_b": 2}), &schema, &ValidationOptions::default())?;
//! assert_eq!(errors[0].custom_error_message.as_deref(), Some("Must be greater than field_a"));
//! # Ok::<(), hform_schema::SchemaError>(())
//! ```

pub mod augment;
mod error;
pub mod format;
pub mod model;
mod options;
mod validate;

pub use augment::augment;
pub use error::SchemaError;
pub use hform_core::{ErrorPath, Keyword, PathSegment, ValidationError};
pub use model::{InstanceType, Properties, Schema, SchemaObject, TypeSet};
pub use options::ValidationOptions;
pub use validate::validate;

use hform_config::HformConfig;
use serde_json::Value;

/// Augment `schema` for `value`, then validate `value` against the result.
pub fn validate_schema(
    value: &Value,
    schema: &Value,
    options: &ValidationOptions,
) -> Result<Vec<ValidationError>, SchemaError> {
    let effective = augment(value, schema, options)?;
    let effective = Schema::from_value(&effective)?;
    validate(Some(value), &effective, options, &ErrorPath::root())
}

/// A schema and the options to validate with, checked once up front.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Value,
    options: ValidationOptions,
}

impl SchemaValidator {
    /// Fails when `schema` cannot be read as a schema.
    pub fn new(schema: Value, options: ValidationOptions) -> Result<Self, SchemaError> {
        Schema::from_value(&schema)?;
        Ok(Self { schema, options })
    }

    /// Use the `[validation]` section of a loaded [`HformConfig`].
    pub fn from_config(config: &HformConfig, schema: Value) -> Result<Self, SchemaError> {
        Self::new(schema, ValidationOptions::from(&config.validation))
    }

    pub fn validate(&self, value: &Value) -> Result<Vec<ValidationError>, SchemaError> {
        validate_schema(value, &self.schema, &self.options)
    }

    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    #[must_use]
    pub const fn options(&self) -> &ValidationOptions {
        &self.options
    }
}
