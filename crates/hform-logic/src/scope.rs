//! Scoped rule evaluation.
//!
//! Every schema node that declares a `logic` registry opens a scope frame
//! holding that node's data, its declared property names and its compiled
//! rules. Frames live in an arena and point at their parent, mirroring the
//! schema nesting: a rule sees its own frame and its ancestors, never a
//! sibling fieldset.
//!
//! One [`RuleEngine`] serves a single validation call. Computed values are
//! memoized per `(scope, name)` for the life of the engine.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::datum::{Datum, value_at_path};
use crate::error::LogicError;
use crate::eval::{self, VarResolver};
use crate::registry::{CompiledRegistry, CompiledRule, LogicRegistry};
use crate::rule::Rule;
use crate::template;

/// Handle to a frame in a [`RuleEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

/// Result of running a named validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Passed,
    /// The rule evaluated falsy. `message` is the interpolated
    /// `errorMessage`, when the registry entry has one.
    Failed { message: Option<String> },
}

#[derive(Debug)]
struct Frame {
    parent: Option<ScopeId>,
    data: Value,
    properties: BTreeSet<String>,
    rules: CompiledRegistry,
}

impl Frame {
    /// Declared properties only. Keys that merely appear in the data do not
    /// count.
    fn declares(&self, root: &str) -> bool {
        self.properties.contains(root)
    }
}

#[derive(Debug, Default)]
pub struct RuleEngine {
    frames: Vec<Frame>,
    memo: HashMap<(ScopeId, String), Datum>,
    in_progress: Vec<(ScopeId, String)>,
}

impl RuleEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope for a schema node.
    ///
    /// `data` is the node's value (`None` when absent), `properties` the
    /// names the node's schema declares. Every rule in `registry` is parsed
    /// here, so a malformed registry fails as soon as its node is entered.
    pub fn push_scope<I>(
        &mut self,
        parent: Option<ScopeId>,
        registry: &LogicRegistry,
        data: Option<&Value>,
        properties: I,
    ) -> Result<ScopeId, LogicError>
    where
        I: IntoIterator<Item = String>,
    {
        let rules = registry.compile()?;
        let id = ScopeId(self.frames.len());
        self.frames.push(Frame {
            parent,
            data: data.cloned().unwrap_or(Value::Null),
            properties: properties.into_iter().collect(),
            rules,
        });
        Ok(id)
    }

    #[must_use]
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.frames.get(scope.0).and_then(|frame| frame.parent)
    }

    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.frames.len()
    }

    fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), |id| self.parent(*id))
            .filter(|id| id.0 < self.frames.len())
    }

    fn find_validation(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, CompiledRule)> {
        self.chain(scope).find_map(|id| {
            self.frames[id.0]
                .rules
                .validations
                .get(name)
                .map(|rule| (id, rule.clone()))
        })
    }

    fn find_computed(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, CompiledRule)> {
        self.chain(scope).find_map(|id| {
            self.frames[id.0]
                .rules
                .computed_values
                .get(name)
                .map(|rule| (id, rule.clone()))
        })
    }

    fn declaring_frame(&self, scope: ScopeId, root: &str) -> Option<ScopeId> {
        self.chain(scope).find(|id| self.frames[id.0].declares(root))
    }

    /// Every statically known variable must be a declared property of
    /// the rule's scope chain, or a computed value reachable from it.
    fn check_variables(&self, scope: ScopeId, rule_name: &str, rule: &Rule) -> Result<(), LogicError> {
        for variable in rule.variables() {
            if variable.is_empty() {
                continue;
            }
            let root = variable.split('.').next().unwrap_or(&variable);
            if self.declaring_frame(scope, root).is_none() && self.find_computed(scope, root).is_none() {
                return Err(LogicError::UnknownVariable {
                    rule: rule_name.to_string(),
                    variable,
                });
            }
        }
        Ok(())
    }

    fn evaluate_in(&mut self, scope: ScopeId, rule_name: &str, rule: &Rule) -> Result<Datum, LogicError> {
        self.check_variables(scope, rule_name, rule)?;
        let mut resolver = ScopeResolver {
            engine: self,
            scope,
            rule: rule_name,
        };
        let result = eval::evaluate(rule, &mut resolver)?;
        trace!(rule = rule_name, scope = scope.0, ?result, "rule evaluated");
        Ok(result)
    }

    /// Run the named validation visible from `scope`.
    ///
    /// The rule runs in the frame that declares it, so its variables read
    /// the declaring node's data.
    pub fn run_validation(&mut self, scope: ScopeId, name: &str) -> Result<ValidationOutcome, LogicError> {
        let (owner, compiled) = self
            .find_validation(scope, name)
            .ok_or_else(|| LogicError::UnknownValidation { name: name.to_string() })?;
        let result = self.evaluate_in(owner, &compiled.name, &compiled.rule)?;
        if result.truthy() {
            return Ok(ValidationOutcome::Passed);
        }
        let message = compiled
            .error_message
            .as_deref()
            .map(|text| self.interpolate(owner, text))
            .transpose()?;
        Ok(ValidationOutcome::Failed { message })
    }

    /// Value of the named computed value visible from `scope`.
    pub fn computed_value(&mut self, scope: ScopeId, name: &str) -> Result<Datum, LogicError> {
        let (owner, compiled) = self
            .find_computed(scope, name)
            .ok_or_else(|| LogicError::UnknownComputedValue { name: name.to_string() })?;
        let key = (owner, name.to_string());
        if let Some(cached) = self.memo.get(&key) {
            return Ok(cached.clone());
        }
        if let Some(start) = self.in_progress.iter().position(|entry| *entry == key) {
            let chain = self.in_progress[start..]
                .iter()
                .map(|(_, name)| name.as_str())
                .chain(std::iter::once(name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(LogicError::CyclicComputedValue(chain));
        }

        self.in_progress.push(key.clone());
        let result = self.evaluate_in(owner, name, &compiled.rule);
        self.in_progress.pop();

        let result = result?;
        self.memo.insert(key, result.clone());
        Ok(result)
    }

    /// Evaluate an inline rule in `scope`.
    pub fn evaluate_inline(&mut self, scope: ScopeId, rule: &Value) -> Result<Datum, LogicError> {
        let rule = Rule::parse(rule)?;
        self.evaluate_in(scope, "inline rule", &rule)
    }

    /// Interpolate `{{name}}` placeholders with computed values from `scope`.
    pub fn interpolate(&mut self, scope: ScopeId, text: &str) -> Result<String, LogicError> {
        self.interpolate_with(scope, text, None)
    }

    fn interpolate_with(
        &mut self,
        scope: ScopeId,
        text: &str,
        inline: Option<&Datum>,
    ) -> Result<String, LogicError> {
        template::interpolate(text, |name| match inline {
            Some(result) if name == "rule" => Ok(result.to_display_string()),
            _ => Ok(self.computed_value(scope, name)?.to_display_string()),
        })
    }

    /// Resolve one `logic-computedAttrs` entry into a concrete attribute
    /// value.
    ///
    /// - a computed-value name is replaced by its result
    /// - a string with `{{...}}` placeholders is interpolated
    /// - `{ "rule": ..., "value"?: "...{{rule}}..." }` is an inline rule
    /// - any other object is resolved entry by entry
    pub fn resolve_attribute(&mut self, scope: ScopeId, spec: &Value) -> Result<Value, LogicError> {
        match spec {
            Value::String(text) if template::is_template(text) => {
                Ok(Value::String(self.interpolate(scope, text)?))
            }
            Value::String(name) => Ok(self.computed_value(scope, name)?.to_value()),
            Value::Object(map) => match map.get("rule") {
                Some(rule) => {
                    let result = self.evaluate_inline(scope, rule)?;
                    match map.get("value") {
                        Some(Value::String(text)) => Ok(Value::String(
                            self.interpolate_with(scope, text, Some(&result))?,
                        )),
                        Some(other) => Err(LogicError::MalformedRule(format!(
                            "inline rule 'value' must be a template string, got {other}"
                        ))),
                        None => Ok(result.to_value()),
                    }
                }
                None => map
                    .iter()
                    .map(|(key, nested)| Ok((key.clone(), self.resolve_attribute(scope, nested)?)))
                    .collect::<Result<Map<String, Value>, LogicError>>()
                    .map(Value::Object),
            },
            other => {
                warn!(attribute = %other, "computed attribute is neither a name, template, nor rule; kept as-is");
                Ok(other.clone())
            }
        }
    }
}

struct ScopeResolver<'e, 'r> {
    engine: &'e mut RuleEngine,
    scope: ScopeId,
    rule: &'r str,
}

impl VarResolver for ScopeResolver<'_, '_> {
    fn lookup(&mut self, path: &str) -> Result<Option<Datum>, LogicError> {
        if path.is_empty() {
            return Ok(Some(Datum::from(&self.engine.frames[self.scope.0].data)));
        }
        let (root, rest) = path.split_once('.').unwrap_or((path, ""));

        if let Some(frame) = self.engine.declaring_frame(self.scope, root) {
            let data = &self.engine.frames[frame.0].data;
            return Ok(value_at_path(data, path).map(Datum::from));
        }

        if self.engine.find_computed(self.scope, root).is_some() {
            let value = self.engine.computed_value(self.scope, root)?;
            return Ok(value.get_path(rest).cloned());
        }

        Err(LogicError::UnknownVariable {
            rule: self.rule.to_string(),
            variable: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry(value: Value) -> LogicRegistry {
        LogicRegistry::from_value(&value).expect("registry parses")
    }

    fn props(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    fn root_engine(logic: Value, data: Value, properties: &[&str]) -> (RuleEngine, ScopeId) {
        let mut engine = RuleEngine::new();
        let root = engine
            .push_scope(None, &registry(logic), Some(&data), props(properties))
            .unwrap();
        (engine, root)
    }

    #[test]
    fn validation_passes_and_fails_on_data() {
        let logic = json!({
            "validations": {
                "a_greater_than_b": {
                    "rule": {">": [{"var": "field_a"}, {"var": "field_b"}]},
                    "errorMessage": "Must be greater than field_a"
                }
            }
        });
        let (mut engine, root) =
            root_engine(logic.clone(), json!({"field_a": 2, "field_b": 0}), &["field_a", "field_b"]);
        assert_eq!(
            engine.run_validation(root, "a_greater_than_b").unwrap(),
            ValidationOutcome::Passed
        );

        let (mut engine, root) =
            root_engine(logic, json!({"field_a": 1, "field_b": 2}), &["field_a", "field_b"]);
        assert_eq!(
            engine.run_validation(root, "a_greater_than_b").unwrap(),
            ValidationOutcome::Failed {
                message: Some("Must be greater than field_a".into())
            }
        );
    }

    #[test]
    fn unknown_validation_name_is_an_authoring_error() {
        let (mut engine, root) = root_engine(json!({}), json!({}), &[]);
        assert_eq!(
            engine.run_validation(root, "nope").unwrap_err(),
            LogicError::UnknownValidation { name: "nope".into() }
        );
    }

    #[test]
    fn undeclared_variable_fails_even_when_short_circuited() {
        let logic = json!({
            "validations": {
                "guarded": {"rule": {"or": [true, {"var": "ghost"}]}}
            }
        });
        let (mut engine, root) = root_engine(logic, json!({"a": 1}), &["a"]);
        assert_eq!(
            engine.run_validation(root, "guarded").unwrap_err(),
            LogicError::UnknownVariable {
                rule: "guarded".into(),
                variable: "ghost".into()
            }
        );
    }

    #[test]
    fn declared_but_absent_property_resolves_to_nan() {
        let logic = json!({"computedValues": {"double": {"rule": {"*": [{"var": "a"}, 2]}}}});
        let (mut engine, root) = root_engine(logic, json!({}), &["a"]);
        let value = engine.computed_value(root, "double").unwrap();
        assert!(matches!(value, Datum::Number(n) if n.is_nan()));
    }

    #[test]
    fn nested_scope_sees_parent_but_root_cannot_see_child() {
        let mut engine = RuleEngine::new();
        let root = engine
            .push_scope(
                None,
                &registry(json!({
                    "computedValues": {"leaks": {"rule": {"var": "street"}}}
                })),
                Some(&json!({"limit": 3, "address": {"street": "Main"}})),
                props(&["limit", "address"]),
            )
            .unwrap();
        let address = engine
            .push_scope(
                Some(root),
                &registry(json!({
                    "computedValues": {"uses_parent": {"rule": {"+": [{"var": "limit"}, 1]}}}
                })),
                Some(&json!({"street": "Main"})),
                props(&["street"]),
            )
            .unwrap();

        assert_eq!(
            engine.computed_value(address, "uses_parent").unwrap(),
            Datum::Number(4.0)
        );
        assert_eq!(
            engine.computed_value(root, "leaks").unwrap_err(),
            LogicError::UnknownVariable {
                rule: "leaks".into(),
                variable: "street".into()
            }
        );
    }

    #[test]
    fn sibling_scopes_are_isolated() {
        let mut engine = RuleEngine::new();
        let root = engine
            .push_scope(None, &LogicRegistry::default(), Some(&json!({})), props(&["left", "right"]))
            .unwrap();
        engine
            .push_scope(Some(root), &LogicRegistry::default(), Some(&json!({"secret": 1})), props(&["secret"]))
            .unwrap();
        let right = engine
            .push_scope(
                Some(root),
                &registry(json!({"computedValues": {"peek": {"rule": {"var": "secret"}}}})),
                Some(&json!({"other": 2})),
                props(&["other"]),
            )
            .unwrap();
        assert!(matches!(
            engine.computed_value(right, "peek"),
            Err(LogicError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn computed_values_can_reference_each_other() {
        let logic = json!({
            "computedValues": {
                "base": {"rule": {"+": [{"var": "a"}, 1]}},
                "derived": {"rule": {"*": [{"var": "base"}, 10]}}
            }
        });
        let (mut engine, root) = root_engine(logic, json!({"a": 2}), &["a"]);
        assert_eq!(engine.computed_value(root, "derived").unwrap(), Datum::Number(30.0));
    }

    #[test]
    fn cyclic_computed_values_are_rejected() {
        let logic = json!({
            "computedValues": {
                "ping": {"rule": {"+": [{"var": "pong"}, 1]}},
                "pong": {"rule": {"+": [{"var": "ping"}, 1]}}
            }
        });
        let (mut engine, root) = root_engine(logic, json!({}), &[]);
        assert_eq!(
            engine.computed_value(root, "ping").unwrap_err(),
            LogicError::CyclicComputedValue("ping -> pong -> ping".into())
        );
    }

    #[test]
    fn computed_values_are_memoized_per_scope() {
        let logic = json!({"computedValues": {"x": {"rule": {"var": "a"}}}});
        let (mut engine, root) = root_engine(logic, json!({"a": 5}), &["a"]);
        assert_eq!(engine.computed_value(root, "x").unwrap(), Datum::Number(5.0));
        assert_eq!(engine.memo.len(), 1);
        assert_eq!(engine.computed_value(root, "x").unwrap(), Datum::Number(5.0));
        assert_eq!(engine.memo.len(), 1);
    }

    #[test]
    fn resolves_attribute_forms() {
        let logic = json!({"computedValues": {"a_times_two": {"rule": {"*": [{"var": "a"}, 2]}}}});
        let (mut engine, root) = root_engine(logic, json!({"a": 3}), &["a"]);

        assert_eq!(engine.resolve_attribute(root, &json!("a_times_two")).unwrap(), json!(6));
        assert_eq!(
            engine
                .resolve_attribute(root, &json!("Must be at least {{a_times_two}}"))
                .unwrap(),
            json!("Must be at least 6")
        );
        assert_eq!(
            engine
                .resolve_attribute(root, &json!({"rule": {"+": [{"var": "a"}, 1]}, "value": "Next: {{rule}}"}))
                .unwrap(),
            json!("Next: 4")
        );
        assert_eq!(
            engine
                .resolve_attribute(root, &json!({"rule": {"-": [{"var": "a"}, 1]}}))
                .unwrap(),
            json!(2)
        );
        assert_eq!(
            engine
                .resolve_attribute(root, &json!({"minimum": "Must be {{a_times_two}} or more"}))
                .unwrap(),
            json!({"minimum": "Must be 6 or more"})
        );
    }

    #[test]
    fn unknown_computed_name_in_attribute_fails() {
        let (mut engine, root) = root_engine(json!({}), json!({}), &[]);
        assert_eq!(
            engine.resolve_attribute(root, &json!("nothing")).unwrap_err(),
            LogicError::UnknownComputedValue { name: "nothing".into() }
        );
    }

    #[test]
    fn undeclared_data_key_is_not_a_variable() {
        let logic = json!({"validations": {"uses_extra": {"rule": {"==": [{"var": "extra"}, 1]}}}});
        for data in [json!({"a": 1}), json!({"a": 1, "extra": 1})] {
            let (mut engine, root) = root_engine(logic.clone(), data, &["a"]);
            assert_eq!(
                engine.run_validation(root, "uses_extra").unwrap_err(),
                LogicError::UnknownVariable {
                    rule: "uses_extra".into(),
                    variable: "extra".into()
                }
            );
        }
    }

    #[test]
    fn error_messages_interpolate_computed_values() {
        let logic = json!({
            "validations": {
                "under_cap": {
                    "rule": {"<=": [{"var": "amount"}, {"var": "cap"}]},
                    "errorMessage": "Must not exceed {{cap}}"
                }
            },
            "computedValues": {"cap": {"rule": {"*": [{"var": "base"}, 2]}}}
        });
        let (mut engine, root) =
            root_engine(logic, json!({"amount": 50, "base": 10}), &["amount", "base"]);
        assert_eq!(
            engine.run_validation(root, "under_cap").unwrap(),
            ValidationOutcome::Failed {
                message: Some("Must not exceed 20".into())
            }
        );
    }
}
