//! Schema augmentation pass.
//!
//! Turns an authored schema plus the data being validated into the
//! effective schema the validator checks. The input is never modified.
//!
//! Walking depth-first alongside the data, each node:
//!
//! 1. opens a rule scope (the root always; other nodes when they carry
//!    `logic`),
//! 2. merges the applicable branch of every `if/then/else` (on the node and
//!    in `allOf` entries made only of `if`/`then`/`else`), deciding each
//!    condition inside that scope, and reopens the scope when a branch
//!    changed the node's `logic` or `properties`,
//! 3. replaces each `logic-computedAttrs` entry with its resolved value,
//! 4. descends into `properties` (with the matching child data) and into
//!    `allOf`/`anyOf`/`oneOf`/`not` (with the same data).
//!
//! `logic-validations` are left in place; the validator runs them.

use hform_core::ErrorPath;
use hform_logic::{LogicRegistry, RuleEngine, ScopeId};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SchemaError;
use crate::model::Schema;
use crate::options::ValidationOptions;
use crate::validate::{Validator, check_depth};

const COMPUTED_ATTRS: &str = "logic-computedAttrs";

/// Build the effective schema for `value`.
pub fn augment(value: &Value, schema: &Value, options: &ValidationOptions) -> Result<Value, SchemaError> {
    let mut augmenter = Augmenter {
        options,
        engine: RuleEngine::new(),
    };
    augmenter.node(schema, Some(value), None, 0, "#")
}

struct Augmenter<'a> {
    options: &'a ValidationOptions,
    engine: RuleEngine,
}

impl Augmenter<'_> {
    fn node(
        &mut self,
        schema: &Value,
        data: Option<&Value>,
        parent: Option<ScopeId>,
        depth: usize,
        at: &str,
    ) -> Result<Value, SchemaError> {
        let Value::Object(source) = schema else {
            return Ok(schema.clone());
        };
        check_depth(self.options, depth)?;

        let mut node = source.clone();
        let authored = frame_inputs(&node);
        let mut scope = self.scope_for(&node, data, parent)?;
        self.resolve_conditionals(&mut node, data, scope, depth, at)?;
        if frame_inputs(&node) != authored {
            scope = self.scope_for(&node, data, parent)?;
        }
        self.resolve_computed_attrs(&mut node, scope, at)?;

        if let Some(Value::Object(properties)) = node.get_mut("properties") {
            for (key, property) in properties.iter_mut() {
                let child = data.and_then(|d| d.get(key));
                let location = format!("{at}/properties/{key}");
                *property = self.node(property, child, Some(scope), depth + 1, &location)?;
            }
        }
        for keyword in ["allOf", "anyOf", "oneOf"] {
            if let Some(Value::Array(branches)) = node.get_mut(keyword) {
                for (index, branch) in branches.iter_mut().enumerate() {
                    let location = format!("{at}/{keyword}/{index}");
                    *branch = self.node(branch, data, Some(scope), depth + 1, &location)?;
                }
            }
        }
        if let Some(negated) = node.get_mut("not") {
            *negated = self.node(negated, data, Some(scope), depth + 1, &format!("{at}/not"))?;
        }

        Ok(Value::Object(node))
    }

    /// The root and nodes with `logic` get a frame of their own. Other
    /// nodes share their parent's.
    fn scope_for(
        &mut self,
        node: &Map<String, Value>,
        data: Option<&Value>,
        parent: Option<ScopeId>,
    ) -> Result<ScopeId, SchemaError> {
        match parent {
            Some(parent) if !node.contains_key("logic") => Ok(parent),
            parent => self.open_scope(node, data, parent),
        }
    }

    fn open_scope(
        &mut self,
        node: &Map<String, Value>,
        data: Option<&Value>,
        parent: Option<ScopeId>,
    ) -> Result<ScopeId, SchemaError> {
        let registry = match node.get("logic") {
            Some(logic) => LogicRegistry::from_value(logic)?,
            None => LogicRegistry::default(),
        };
        Ok(self
            .engine
            .push_scope(parent, &registry, data, declared_properties(node))?)
    }

    /// Merge `if/then/else` branches until none are left on this node.
    fn resolve_conditionals(
        &mut self,
        node: &mut Map<String, Value>,
        data: Option<&Value>,
        scope: ScopeId,
        depth: usize,
        at: &str,
    ) -> Result<(), SchemaError> {
        loop {
            let (conditional, location) = if node.contains_key("if") {
                (take_conditional(node), format!("{at}/if"))
            } else if let Some(index) = pending_all_of(node) {
                let Some(entry) = node
                    .get_mut("allOf")
                    .and_then(Value::as_array_mut)
                    .and_then(|entries| entries.get_mut(index))
                    .map(|slot| std::mem::replace(slot, Value::Object(Map::new())))
                else {
                    break;
                };
                let Value::Object(mut entry) = entry else {
                    break;
                };
                (take_conditional(&mut entry), format!("{at}/allOf/{index}/if"))
            } else {
                break;
            };

            let Some(conditional) = conditional else {
                continue;
            };
            let matched = self.condition_holds(&conditional.condition, data, scope, depth, &location)?;
            let (chosen, branch) = if matched {
                ("then", conditional.then_branch)
            } else {
                ("else", conditional.else_branch)
            };
            debug!(schema = %location, branch = chosen, applied = branch.is_some(), "conditional resolved");
            if let Some(branch) = branch {
                merge_branch(node, branch);
            }
        }
        Ok(())
    }

    fn condition_holds(
        &mut self,
        condition: &Value,
        data: Option<&Value>,
        scope: ScopeId,
        depth: usize,
        at: &str,
    ) -> Result<bool, SchemaError> {
        let condition = Schema::from_value(condition).map_err(|e| match e {
            SchemaError::InvalidSchema { reason, .. } => SchemaError::invalid(at, reason),
            other => other,
        })?;
        Validator::new(self.options, &mut self.engine).passes(
            data,
            &condition,
            &ErrorPath::root(),
            Some(scope),
            depth + 1,
        )
    }

    fn resolve_computed_attrs(
        &mut self,
        node: &mut Map<String, Value>,
        scope: ScopeId,
        at: &str,
    ) -> Result<(), SchemaError> {
        let Some(attrs) = node.shift_remove(COMPUTED_ATTRS) else {
            return Ok(());
        };
        let Value::Object(attrs) = attrs else {
            return Err(SchemaError::invalid(
                format!("{at}/{COMPUTED_ATTRS}"),
                "must be an object mapping attribute names to computed values",
            ));
        };
        for (attribute, spec) in attrs {
            let resolved = self.engine.resolve_attribute(scope, &spec)?;
            debug!(schema = %at, %attribute, value = %resolved, "computed attribute resolved");
            node.insert(attribute, resolved);
        }
        Ok(())
    }
}

struct Conditional {
    condition: Value,
    then_branch: Option<Value>,
    else_branch: Option<Value>,
}

fn take_conditional(node: &mut Map<String, Value>) -> Option<Conditional> {
    let condition = node.shift_remove("if")?;
    Some(Conditional {
        condition,
        then_branch: node.shift_remove("then"),
        else_branch: node.shift_remove("else"),
    })
}

/// What a node's scope frame is built from: its registry and its declared
/// property names.
fn frame_inputs(node: &Map<String, Value>) -> (Option<Value>, Vec<String>) {
    (node.get("logic").cloned(), declared_properties(node))
}

fn declared_properties(node: &Map<String, Value>) -> Vec<String> {
    match node.get("properties") {
        Some(Value::Object(properties)) => properties.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Index of the first `allOf` entry that is a bare conditional.
fn pending_all_of(node: &Map<String, Value>) -> Option<usize> {
    node.get("allOf")?.as_array()?.iter().position(|entry| {
        entry.as_object().is_some_and(|entry| {
            entry.contains_key("if") && entry.keys().all(|k| matches!(k.as_str(), "if" | "then" | "else"))
        })
    })
}

/// Merge a chosen branch into the node it applies to.
///
/// `properties` merge per property, `required` and `logic-validations`
/// take the union, `allOf` appends, registries and computed attributes
/// merge by name. An `anyOf`/`oneOf`/`not` already on the node moves into
/// `allOf` instead of being replaced. Anything else is overridden.
fn merge_branch(node: &mut Map<String, Value>, branch: Value) {
    let Value::Object(branch) = branch else {
        push_all_of(node, branch);
        return;
    };
    merge_schema(node, branch);
}

fn merge_schema(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match key.as_str() {
            "properties" => merge_properties(target, value),
            "required" | "logic-validations" => union_array(target, key, value),
            "allOf" => match value {
                Value::Array(entries) => entries.into_iter().for_each(|entry| push_all_of(target, entry)),
                other => {
                    target.insert(key, other);
                }
            },
            "anyOf" | "oneOf" | "not" if target.contains_key(&key) => {
                let mut wrapped = Map::new();
                wrapped.insert(key, value);
                push_all_of(target, Value::Object(wrapped));
            }
            COMPUTED_ATTRS => merge_maps(target, key, value),
            "logic" => merge_logic(target, value),
            _ => {
                target.insert(key, value);
            }
        }
    }
}

fn merge_properties(target: &mut Map<String, Value>, incoming: Value) {
    let Value::Object(incoming) = incoming else {
        target.insert("properties".into(), incoming);
        return;
    };
    let properties = target
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(properties) = properties else {
        *properties = Value::Object(incoming);
        return;
    };
    for (name, schema) in incoming {
        match (properties.get_mut(&name), schema) {
            (Some(Value::Object(existing)), Value::Object(schema)) => merge_schema(existing, schema),
            (_, schema) => {
                properties.insert(name, schema);
            }
        }
    }
}

fn union_array(target: &mut Map<String, Value>, key: String, incoming: Value) {
    let Value::Array(incoming) = incoming else {
        target.insert(key, incoming);
        return;
    };
    match target.get_mut(&key) {
        Some(Value::Array(existing)) => {
            for item in incoming {
                if !existing.contains(&item) {
                    existing.push(item);
                }
            }
        }
        _ => {
            target.insert(key, Value::Array(incoming));
        }
    }
}

fn push_all_of(target: &mut Map<String, Value>, entry: Value) {
    match target.get_mut("allOf") {
        Some(Value::Array(entries)) => entries.push(entry),
        _ => {
            target.insert("allOf".into(), Value::Array(vec![entry]));
        }
    }
}

fn merge_maps(target: &mut Map<String, Value>, key: String, incoming: Value) {
    match (target.get_mut(&key), incoming) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => existing.extend(incoming),
        (_, incoming) => {
            target.insert(key, incoming);
        }
    }
}

fn merge_logic(target: &mut Map<String, Value>, incoming: Value) {
    match (target.get_mut("logic"), incoming) {
        (Some(Value::Object(existing)), Value::Object(sections)) => {
            for (section, entries) in sections {
                merge_maps(existing, section, entries);
            }
        }
        (_, incoming) => {
            target.insert("logic".into(), incoming);
        }
    }
}
