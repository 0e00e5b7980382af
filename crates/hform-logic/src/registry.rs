//! The `logic` registry a schema node declares.
//!
//! ```json
//! "logic": {
//!   "validations": {
//!     "a_greater_than_b": {
//!       "rule": { ">": [{ "var": "field_a" }, { "var": "field_b" }] },
//!       "errorMessage": "Must be greater than field_a"
//!     }
//!   },
//!   "computedValues": {
//!     "a_times_two": { "rule": { "*": [{ "var": "field_a" }, 2] } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LogicError;
use crate::rule::Rule;

/// One registry entry as written in the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    #[serde(default)]
    pub rule: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicRegistry {
    #[serde(default)]
    pub validations: BTreeMap<String, RuleDefinition>,
    #[serde(default)]
    pub computed_values: BTreeMap<String, RuleDefinition>,
}

impl LogicRegistry {
    /// Read a registry from the schema's `logic` value.
    pub fn from_value(value: &Value) -> Result<Self, LogicError> {
        Self::deserialize(value).map_err(|e| LogicError::InvalidRegistry(e.to_string()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validations.is_empty() && self.computed_values.is_empty()
    }

    /// Parse every rule body. Fails on the first missing body or bad
    /// operator, in name order.
    pub fn compile(&self) -> Result<CompiledRegistry, LogicError> {
        Ok(CompiledRegistry {
            validations: compile_entries(&self.validations)?,
            computed_values: compile_entries(&self.computed_values)?,
        })
    }
}

/// A registry entry with its rule parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub name: String,
    pub rule: Rule,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledRegistry {
    pub validations: BTreeMap<String, CompiledRule>,
    pub computed_values: BTreeMap<String, CompiledRule>,
}

fn compile_entries(
    entries: &BTreeMap<String, RuleDefinition>,
) -> Result<BTreeMap<String, CompiledRule>, LogicError> {
    entries
        .iter()
        .map(|(name, definition)| {
            let body = match &definition.rule {
                Some(body) if !body.is_null() => body,
                _ => return Err(LogicError::MissingRule { name: name.clone() }),
            };
            let compiled = CompiledRule {
                name: name.clone(),
                rule: Rule::parse(body)?,
                error_message: definition.error_message.clone(),
            };
            Ok((name.clone(), compiled))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reads_camel_case_sections() {
        let registry = LogicRegistry::from_value(&json!({
            "validations": {
                "positive": {"rule": {">": [{"var": "x"}, 0]}, "errorMessage": "Must be positive"}
            },
            "computedValues": {
                "double_x": {"rule": {"*": [{"var": "x"}, 2]}}
            }
        }))
        .unwrap();
        assert_eq!(registry.validations.len(), 1);
        assert_eq!(
            registry.validations["positive"].error_message.as_deref(),
            Some("Must be positive")
        );
        assert!(registry.computed_values.contains_key("double_x"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let registry = LogicRegistry::from_value(&json!({})).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn non_object_registry_is_invalid() {
        assert!(matches!(
            LogicRegistry::from_value(&json!(["nope"])),
            Err(LogicError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn entry_without_rule_fails_to_compile() {
        let registry = LogicRegistry::from_value(&json!({
            "validations": {"empty": {"errorMessage": "no body"}}
        }))
        .unwrap();
        assert_eq!(
            registry.compile().unwrap_err(),
            LogicError::MissingRule { name: "empty".into() }
        );
    }

    #[test]
    fn bad_operator_fails_to_compile() {
        let registry = LogicRegistry::from_value(&json!({
            "computedValues": {"weird": {"rule": {"pow": [2, 3]}}}
        }))
        .unwrap();
        assert_eq!(
            registry.compile().unwrap_err(),
            LogicError::UnsupportedOperator("pow".into())
        );
    }
}
