//! Schema-authoring errors raised by the rule engine.
//!
//! These are programmer mistakes in the schema, never data failures. The
//! first one encountered aborts the current validation call.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    /// A field lists a validation name no enclosing registry declares.
    #[error("unknown validation '{name}': not declared in any enclosing logic registry")]
    UnknownValidation { name: String },

    /// A computed attribute or template names a computed value no enclosing
    /// registry declares.
    #[error("unknown computed value '{name}': not declared in any enclosing logic registry")]
    UnknownComputedValue { name: String },

    /// A registry entry has no `rule` body.
    #[error("rule '{name}' has no rule body")]
    MissingRule { name: String },

    /// A `var` names something outside the rule's own scope chain.
    #[error("rule '{rule}' references variable '{variable}' which is not reachable from its scope")]
    UnknownVariable { rule: String, variable: String },

    /// An expression uses an operator outside the supported vocabulary.
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    /// An expression has the wrong shape for its operator.
    #[error("malformed rule: {0}")]
    MalformedRule(String),

    /// Computed values reference each other in a loop.
    #[error("cyclic computed value: {0}")]
    CyclicComputedValue(String),

    /// The `logic` object itself could not be read.
    #[error("invalid logic registry: {0}")]
    InvalidRegistry(String),
}
