use hform_core::{Keyword, ValidationError, deep_equal};
use serde_json::Value;

use super::{Node, Validator, fewer_than, more_than};
use crate::error::SchemaError;

pub(super) fn check(
    validator: &mut Validator<'_>,
    node: &Node<'_>,
    errors: &mut Vec<ValidationError>,
) -> Result<(), SchemaError> {
    let Value::Array(items) = node.value else {
        return Ok(());
    };
    let schema = node.schema;

    if let Some(min) = &schema.min_items {
        if fewer_than(items.len(), min) {
            errors.push(node.error(Keyword::MinItems, format!("must NOT have fewer than {min} items")));
        }
    }
    if let Some(max) = &schema.max_items {
        if more_than(items.len(), max) {
            errors.push(node.error(Keyword::MaxItems, format!("must NOT have more than {max} items")));
        }
    }
    if schema.unique_items {
        if let Some((i, j)) = first_duplicate(items) {
            errors.push(node.error(
                Keyword::UniqueItems,
                format!("must NOT have duplicate items (items ## {j} and {i} are identical)"),
            ));
        }
    }

    for (index, (item, item_schema)) in items.iter().zip(&schema.prefix_items).enumerate() {
        errors.extend(validator.validate_node(
            Some(item),
            item_schema,
            &node.path.keyword_index("prefixItems", index),
            Some(node.scope),
            node.depth + 1,
        )?);
    }
    if let Some(item_schema) = &schema.items {
        for (index, item) in items.iter().enumerate().skip(schema.prefix_items.len()) {
            errors.extend(validator.validate_node(
                Some(item),
                item_schema,
                &node.path.keyword_index("items", index),
                Some(node.scope),
                node.depth + 1,
            )?);
        }
    }

    let Some(contains) = &schema.contains else {
        return Ok(());
    };
    let mut matched = 0_usize;
    for item in items {
        if validator.passes(Some(item), contains, node.path, Some(node.scope), node.depth + 1)? {
            matched += 1;
        }
    }
    match &schema.min_contains {
        Some(min) if fewer_than(matched, min) => {
            errors.push(node.error(
                Keyword::MinContains,
                format!("must contain at least {min} valid item(s)"),
            ));
        }
        None if matched == 0 => {
            errors.push(node.error(Keyword::Contains, "must contain at least 1 valid item"));
        }
        _ => {}
    }
    if let Some(max) = &schema.max_contains {
        if more_than(matched, max) {
            errors.push(node.error(
                Keyword::MaxContains,
                format!("must contain at most {max} valid item(s)"),
            ));
        }
    }
    Ok(())
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    items.iter().enumerate().find_map(|(i, left)| {
        items[i + 1..]
            .iter()
            .position(|right| deep_equal(left, right))
            .map(|offset| (i, i + 1 + offset))
    })
}
