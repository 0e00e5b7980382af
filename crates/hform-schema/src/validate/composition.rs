//! `allOf`, `anyOf`, `oneOf`, `not` and runtime `if/then/else`.
//!
//! Only `allOf` surfaces its branches' errors (under `["allOf", i]`). The
//! others validate their branches silently and report one error of their
//! own at the node's path.

use hform_core::{Keyword, ValidationError};

use super::{Node, Validator};
use crate::error::SchemaError;
use crate::model::Schema;

pub(super) fn check(
    validator: &mut Validator<'_>,
    node: &Node<'_>,
    errors: &mut Vec<ValidationError>,
) -> Result<(), SchemaError> {
    let schema = node.schema;

    for (index, branch) in schema.all_of.iter().enumerate() {
        errors.extend(validator.validate_node(
            Some(node.value),
            branch,
            &node.path.keyword_index("allOf", index),
            Some(node.scope),
            node.depth + 1,
        )?);
    }

    if let Some(branches) = &schema.any_of {
        let mut any = false;
        for branch in branches {
            if passes(validator, node, branch)? {
                any = true;
                break;
            }
        }
        if !any {
            errors.push(node.error(Keyword::AnyOf, "must match a schema in anyOf"));
        }
    }

    if let Some(branches) = &schema.one_of {
        let mut passing = 0;
        for branch in branches {
            if passes(validator, node, branch)? {
                passing += 1;
                if passing > 1 {
                    break;
                }
            }
        }
        if passing != 1 {
            errors.push(node.error(Keyword::OneOf, "must match exactly one schema in oneOf"));
        }
    }

    if let Some(negated) = &schema.not {
        if passes(validator, node, negated)? {
            errors.push(node.error(Keyword::Not, "must NOT be valid"));
        }
    }

    // Conditionals left after augmentation (e.g. under `items`).
    if let Some(condition) = &schema.if_schema {
        let branch = if passes(validator, node, condition)? {
            schema.then_schema.as_ref()
        } else {
            schema.else_schema.as_ref()
        };
        if let Some(branch) = branch {
            errors.extend(validator.validate_node(
                Some(node.value),
                branch,
                node.path,
                Some(node.scope),
                node.depth + 1,
            )?);
        }
    }
    Ok(())
}

fn passes(validator: &mut Validator<'_>, node: &Node<'_>, branch: &Schema) -> Result<bool, SchemaError> {
    validator.passes(Some(node.value), branch, node.path, Some(node.scope), node.depth + 1)
}
