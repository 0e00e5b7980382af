//! Validation entry point.
//!
//! [`validate`] walks one schema node at a time. Every object node is
//! checked in a fixed order and all categories contribute:
//!
//! 1. base checks: `type`, `enum`, `const`
//! 2. type-specific constraints (string, number, object, array)
//! 3. composition: `allOf`, `anyOf`, `oneOf`, `not`, `if/then/else`
//! 4. named rule validations listed in `logic-validations`
//!
//! The root node and every node with a `logic` registry open a rule scope
//! for their subtree before any check runs.

mod array;
mod composition;
mod number;
mod object;
mod string;

use hform_core::{ErrorPath, Keyword, ValidationError, deep_equal};
use hform_logic::{LogicRegistry, RuleEngine, ScopeId, ValidationOutcome};
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::SchemaError;
use crate::model::{Schema, SchemaObject};
use crate::options::ValidationOptions;

/// Validate `value` against an effective schema (no augmentation).
///
/// `value` is `None` when the validated value is absent. Errors are
/// reported relative to `path`.
pub fn validate(
    value: Option<&Value>,
    schema: &Schema,
    options: &ValidationOptions,
    path: &ErrorPath,
) -> Result<Vec<ValidationError>, SchemaError> {
    let mut engine = RuleEngine::new();
    Validator::new(options, &mut engine).validate_node(value, schema, path, None, 0)
}

/// One object schema node being checked against one present value.
pub(crate) struct Node<'n> {
    schema: &'n SchemaObject,
    value: &'n Value,
    path: &'n ErrorPath,
    scope: ScopeId,
    depth: usize,
}

impl Node<'_> {
    fn error(&self, keyword: Keyword, message: impl Into<String>) -> ValidationError {
        ValidationError::new(self.path.clone(), keyword, message)
            .with_schema(&self.schema.source)
            .with_value(Some(self.value))
    }
}

pub(crate) struct Validator<'a> {
    options: &'a ValidationOptions,
    engine: &'a mut RuleEngine,
}

impl<'a> Validator<'a> {
    pub(crate) const fn new(options: &'a ValidationOptions, engine: &'a mut RuleEngine) -> Self {
        Self { options, engine }
    }

    pub(crate) fn validate_node(
        &mut self,
        value: Option<&Value>,
        schema: &Schema,
        path: &ErrorPath,
        scope: Option<ScopeId>,
        depth: usize,
    ) -> Result<Vec<ValidationError>, SchemaError> {
        let object = match schema {
            Schema::Bool(true) => return Ok(Vec::new()),
            Schema::Bool(false) => {
                return Ok(vec![
                    ValidationError::new(path.clone(), Keyword::Valid, "boolean schema is false")
                        .with_schema(schema.source())
                        .with_value(value),
                ]);
            }
            Schema::Object(object) => object,
        };
        check_depth(self.options, depth)?;

        let value = match value {
            Some(present) if !self.options.is_absent(value) => present,
            _ => return Ok(Vec::new()),
        };

        let scope = self.open_scope(object, value, scope)?;
        let node = Node {
            schema: object,
            value,
            path,
            scope,
            depth,
        };

        let mut errors = Vec::new();
        check_base(&node, &mut errors);
        string::check(self.options, &node, &mut errors);
        number::check(&node, &mut errors);
        object::check(self, &node, &mut errors)?;
        array::check(self, &node, &mut errors)?;
        composition::check(self, &node, &mut errors)?;
        self.check_rules(&node, &mut errors)?;
        Ok(errors)
    }

    /// Validate and discard the errors.
    pub(crate) fn passes(
        &mut self,
        value: Option<&Value>,
        schema: &Schema,
        path: &ErrorPath,
        scope: Option<ScopeId>,
        depth: usize,
    ) -> Result<bool, SchemaError> {
        Ok(self.validate_node(value, schema, path, scope, depth)?.is_empty())
    }

    fn open_scope(
        &mut self,
        object: &SchemaObject,
        value: &Value,
        parent: Option<ScopeId>,
    ) -> Result<ScopeId, SchemaError> {
        let registry = match (&object.logic, parent) {
            (None, Some(parent)) => return Ok(parent),
            (None, None) => LogicRegistry::default(),
            (Some(logic), _) => LogicRegistry::from_value(logic)?,
        };
        Ok(self
            .engine
            .push_scope(parent, &registry, Some(value), object.property_names())?)
    }

    fn check_rules(&mut self, node: &Node<'_>, errors: &mut Vec<ValidationError>) -> Result<(), SchemaError> {
        for name in &node.schema.logic_validations {
            if let ValidationOutcome::Failed { message } = self.engine.run_validation(node.scope, name)? {
                debug!(rule = %name, path = %node.path, "named validation failed");
                errors.push(
                    node.error(Keyword::JsonLogic, format!("must satisfy rule '{name}'"))
                        .with_custom_message(message),
                );
            }
        }
        Ok(())
    }
}

pub(crate) fn check_depth(options: &ValidationOptions, depth: usize) -> Result<(), SchemaError> {
    match options.max_depth {
        Some(max) if depth > max => Err(SchemaError::DepthExceeded { depth: max }),
        _ => Ok(()),
    }
}

fn check_base(node: &Node<'_>, errors: &mut Vec<ValidationError>) {
    let schema = node.schema;
    if let Some(types) = &schema.types {
        if !types.matches(node.value) {
            errors.push(node.error(Keyword::Type, format!("must be {types}")));
        }
    }
    if let Some(allowed) = &schema.enum_values {
        if !allowed.iter().any(|candidate| deep_equal(candidate, node.value)) {
            errors.push(node.error(Keyword::Enum, "must be equal to one of the allowed values"));
        }
    }
    if let Some(expected) = &schema.const_value {
        if !deep_equal(expected, node.value) {
            errors.push(node.error(Keyword::Const, "must be equal to constant"));
        }
    }
}

/// `len < bound`. Computed count bounds may be negative or fractional, so
/// lengths compare against them as floats.
#[allow(clippy::cast_precision_loss)]
fn fewer_than(len: usize, bound: &Number) -> bool {
    bound.as_f64().is_some_and(|bound| (len as f64) < bound)
}

/// `len > bound`, compared like [`fewer_than`].
#[allow(clippy::cast_precision_loss)]
fn more_than(len: usize, bound: &Number) -> bool {
    bound.as_f64().is_some_and(|bound| (len as f64) > bound)
}
