use hform_core::{Keyword, ValidationError};
use serde_json::Value;
use tracing::warn;

use super::{Node, fewer_than, more_than};
use crate::format;
use crate::options::ValidationOptions;

pub(super) fn check(options: &ValidationOptions, node: &Node<'_>, errors: &mut Vec<ValidationError>) {
    let Value::String(text) = node.value else {
        return;
    };
    let schema = node.schema;
    let length = text.chars().count();

    if let Some(min) = &schema.min_length {
        if fewer_than(length, min) {
            errors.push(node.error(
                Keyword::MinLength,
                format!("must NOT have fewer than {min} characters"),
            ));
        }
    }
    if let Some(max) = &schema.max_length {
        if more_than(length, max) {
            errors.push(node.error(
                Keyword::MaxLength,
                format!("must NOT have more than {max} characters"),
            ));
        }
    }
    if let Some(pattern) = &schema.pattern {
        if !pattern.is_match(text) {
            errors.push(node.error(
                Keyword::Pattern,
                format!("must match pattern \"{}\"", pattern.as_str()),
            ));
        }
    }
    if let Some(name) = schema.format.as_ref().filter(|_| options.validate_formats) {
        match format::check(name, text) {
            Some(true) => {}
            Some(false) => {
                errors.push(node.error(Keyword::Format, format!("must be a valid {name} format")));
            }
            None => warn!(format = %name, path = %node.path, "unknown format; not checked"),
        }
    }
}
