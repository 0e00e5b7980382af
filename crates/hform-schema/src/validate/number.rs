use hform_core::{Keyword, ValidationError};
use serde_json::{Number, Value};

use super::Node;

/// Quotients this close to an integer count as exact.
const MULTIPLE_TOLERANCE: f64 = 1e-9;

pub(super) fn check(node: &Node<'_>, errors: &mut Vec<ValidationError>) {
    let Value::Number(number) = node.value else {
        return;
    };
    let Some(x) = number.as_f64() else {
        return;
    };
    let schema = node.schema;

    if let Some(min) = bound(schema.minimum.as_ref()) {
        if x < min.1 {
            errors.push(node.error(Keyword::Minimum, format!("must be >= {}", min.0)));
        }
    }
    if let Some(max) = bound(schema.maximum.as_ref()) {
        if x > max.1 {
            errors.push(node.error(Keyword::Maximum, format!("must be <= {}", max.0)));
        }
    }
    if let Some(min) = bound(schema.exclusive_minimum.as_ref()) {
        if x <= min.1 {
            errors.push(node.error(Keyword::ExclusiveMinimum, format!("must be > {}", min.0)));
        }
    }
    if let Some(max) = bound(schema.exclusive_maximum.as_ref()) {
        if x >= max.1 {
            errors.push(node.error(Keyword::ExclusiveMaximum, format!("must be < {}", max.0)));
        }
    }
    if let Some(divisor) = bound(schema.multiple_of.as_ref()) {
        if divisor.1 > 0.0 && !is_multiple(number, x, divisor) {
            errors.push(node.error(Keyword::MultipleOf, format!("must be multiple of {}", divisor.0)));
        }
    }
}

fn bound(number: Option<&Number>) -> Option<(&Number, f64)> {
    number.and_then(|n| n.as_f64().map(|f| (n, f)))
}

fn is_multiple(number: &Number, x: f64, divisor: (&Number, f64)) -> bool {
    if let (Some(n), Some(d)) = (number.as_i64(), divisor.0.as_i64()) {
        return d != 0 && n % d == 0;
    }
    let quotient = x / divisor.1;
    quotient.is_finite() && (quotient - quotient.round()).abs() < MULTIPLE_TOLERANCE
}
