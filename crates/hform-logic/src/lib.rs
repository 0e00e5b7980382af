//! # hform-logic
//!
//! The rule engine behind hform's derived schema attributes and cross-field
//! validations.
//!
//! Rules are JSON-logic expression trees over a closed operator set
//! ([`Operator`]). They are declared in a schema node's `logic` registry as
//! named `validations` (falsy result = data failure) and `computedValues`
//! (results substituted into schema attributes or `{{name}}` templates).
//!
//! ## Scoping
//!
//! [`RuleEngine`] keeps one frame per schema node that declares a registry.
//! A rule resolves `var`s against its declaring frame's properties and then
//! its ancestors'. Referencing anything else is a schema-authoring error
//! ([`LogicError::UnknownVariable`]), detected before the rule runs.
//!
//! ```
//! use hform_logic::{LogicRegistry, RuleEngine};
//! use serde_json::json;
//!
//! let registry = LogicRegistry::from_value(&json!({
//!     "computedValues": { "a_times_two": { "rule": { "*": [{ "var": "a" }, 2] } } }
//! }))
//! .unwrap();
//! let mut engine = RuleEngine::new();
//! let root = engine
//!     .push_scope(None, &registry, Some(&json!({ "a": 4 })), ["a".to_string()])
//!     .unwrap();
//! let minimum = engine.resolve_attribute(root, &json!("a_times_two")).unwrap();
//! assert_eq!(minimum, json!(8));
//! ```

pub mod datum;
mod error;
pub mod eval;
pub mod registry;
pub mod rule;
pub mod scope;
pub mod template;

pub use datum::Datum;
pub use error::LogicError;
pub use eval::{DatumResolver, VarResolver, apply_rule, evaluate};
pub use registry::{LogicRegistry, RuleDefinition};
pub use rule::{Operator, Rule};
pub use scope::{RuleEngine, ScopeId, ValidationOutcome};
