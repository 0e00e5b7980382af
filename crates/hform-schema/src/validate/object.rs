use hform_core::{Keyword, ValidationError};
use serde_json::Value;

use super::{Node, Validator};
use crate::error::SchemaError;
use crate::model::Schema;

/// `required`, then `properties`, then `additionalProperties`.
pub(super) fn check(
    validator: &mut Validator<'_>,
    node: &Node<'_>,
    errors: &mut Vec<ValidationError>,
) -> Result<(), SchemaError> {
    let Value::Object(map) = node.value else {
        return Ok(());
    };
    let schema = node.schema;

    for key in &schema.required {
        let found = map.get(key);
        if validator.options.is_absent(found) {
            errors.push(
                ValidationError::new(
                    node.path.child(key.as_str()),
                    Keyword::Required,
                    format!("must have required property '{key}'"),
                )
                .with_schema(&schema.source)
                .with_value(found),
            );
        }
    }

    for (key, property) in schema.properties.iter() {
        if let Some(child) = map.get(key) {
            errors.extend(validator.validate_node(
                Some(child),
                property,
                &node.path.child(key),
                Some(node.scope),
                node.depth + 1,
            )?);
        }
    }

    let Some(additional) = &schema.additional_properties else {
        return Ok(());
    };
    for (key, child) in map {
        if schema.properties.contains_key(key) || validator.options.is_absent(Some(child)) {
            continue;
        }
        let path = node.path.child(key.as_str());
        if matches!(additional, Schema::Bool(false)) {
            errors.push(
                ValidationError::new(
                    path,
                    Keyword::AdditionalProperties,
                    format!("must NOT have additional property '{key}'"),
                )
                .with_schema(&schema.source)
                .with_value(Some(child)),
            );
        } else {
            errors.extend(validator.validate_node(Some(child), additional, &path, Some(node.scope), node.depth + 1)?);
        }
    }
    Ok(())
}
