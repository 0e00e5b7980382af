//! Expression evaluation.
//!
//! Evaluation is pure over its inputs: `var` lookups go through a
//! [`VarResolver`], which is where scoping and computed values live.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::datum::Datum;
use crate::error::LogicError;
use crate::rule::{Operator, Rule};

/// Source of `var` bindings.
pub trait VarResolver {
    /// Value at a dotted path. `Ok(None)` means the path is valid but holds
    /// nothing; unreachable paths are an `Err`.
    fn lookup(&mut self, path: &str) -> Result<Option<Datum>, LogicError>;
}

/// Resolves against a single datum. Used for per-element evaluation inside
/// `reduce`, `map` and `filter`, and for rules evaluated against plain data.
pub struct DatumResolver<'a>(pub &'a Datum);

impl VarResolver for DatumResolver<'_> {
    fn lookup(&mut self, path: &str) -> Result<Option<Datum>, LogicError> {
        Ok(self.0.get_path(path).cloned())
    }
}

/// Evaluate a rule.
pub fn evaluate(rule: &Rule, resolver: &mut dyn VarResolver) -> Result<Datum, LogicError> {
    match rule {
        Rule::Literal(value) => Ok(Datum::from(value)),
        Rule::Array(items) => items
            .iter()
            .map(|item| evaluate(item, resolver))
            .collect::<Result<Vec<_>, _>>()
            .map(Datum::Array),
        Rule::Var { path, default } => evaluate_var(path, default.as_deref(), resolver),
        Rule::Operation { op, args } => apply(*op, args, resolver),
    }
}

fn evaluate_var(
    path: &Rule,
    default: Option<&Rule>,
    resolver: &mut dyn VarResolver,
) -> Result<Datum, LogicError> {
    let path = match evaluate(path, resolver)? {
        Datum::Null => String::new(),
        other => other.to_display_string(),
    };
    match resolver.lookup(&path)? {
        Some(found) if !found.is_null() => Ok(found),
        _ => match default {
            Some(default) => evaluate(default, resolver),
            None => Ok(Datum::NAN),
        },
    }
}

fn apply(op: Operator, args: &[Rule], resolver: &mut dyn VarResolver) -> Result<Datum, LogicError> {
    match op {
        Operator::Var => Err(LogicError::MalformedRule(
            "'var' must be parsed as a variable".into(),
        )),
        Operator::And => {
            let mut last = Datum::Null;
            for arg in args {
                last = evaluate(arg, resolver)?;
                if !last.truthy() {
                    break;
                }
            }
            Ok(last)
        }
        Operator::Or => {
            let mut last = Datum::Null;
            for arg in args {
                last = evaluate(arg, resolver)?;
                if last.truthy() {
                    break;
                }
            }
            Ok(last)
        }
        Operator::If => {
            for pair in args.chunks(2) {
                match pair {
                    [condition, then] => {
                        if evaluate(condition, resolver)?.truthy() {
                            return evaluate(then, resolver);
                        }
                    }
                    [otherwise] => return evaluate(otherwise, resolver),
                    _ => {}
                }
            }
            Ok(Datum::Null)
        }
        Operator::Reduce => reduce(args, resolver),
        Operator::Map | Operator::Filter => map_or_filter(op, args, resolver),
        _ => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, resolver))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(apply_strict(op, &values))
        }
    }
}

/// Operators that evaluate every argument up front.
fn apply_strict(op: Operator, values: &[Datum]) -> Datum {
    match (op, values) {
        (Operator::Greater, [a, b]) => ordered(a, b, Ordering::is_gt),
        (Operator::GreaterOrEqual, [a, b]) => ordered(a, b, Ordering::is_ge),
        (Operator::Less, [a, b]) => ordered(a, b, Ordering::is_lt),
        (Operator::Less, [a, b, c]) => {
            Datum::Bool(ordered(a, b, Ordering::is_lt).truthy() && ordered(b, c, Ordering::is_lt).truthy())
        }
        (Operator::LessOrEqual, [a, b]) => ordered(a, b, Ordering::is_le),
        (Operator::LessOrEqual, [a, b, c]) => {
            Datum::Bool(ordered(a, b, Ordering::is_le).truthy() && ordered(b, c, Ordering::is_le).truthy())
        }
        (Operator::Equal, [a, b]) => Datum::Bool(a.loose_eq(b)),
        (Operator::StrictEqual, [a, b]) => Datum::Bool(a.strict_eq(b)),
        (Operator::NotEqual, [a, b]) => Datum::Bool(!a.loose_eq(b)),
        (Operator::StrictNotEqual, [a, b]) => Datum::Bool(!a.strict_eq(b)),
        (Operator::Not, [a]) => Datum::Bool(!a.truthy()),
        (Operator::Truthy, [a]) => Datum::Bool(a.truthy()),
        (Operator::Add, _) => Datum::Number(values.iter().map(Datum::to_number).sum()),
        (Operator::Multiply, []) => Datum::Null,
        (Operator::Multiply, _) => Datum::Number(values.iter().map(Datum::to_number).product()),
        (Operator::Subtract, [a]) => Datum::Number(-a.to_number()),
        (Operator::Subtract, [a, b]) => Datum::Number(a.to_number() - b.to_number()),
        (Operator::Divide, [a, b]) => Datum::Number(a.to_number() / b.to_number()),
        (Operator::Modulo, [a, b]) => Datum::Number(a.to_number() % b.to_number()),
        (Operator::Min, [_, ..]) => extremum(values, f64::min),
        (Operator::Max, [_, ..]) => extremum(values, f64::max),
        (Operator::Cat, _) => Datum::String(values.iter().map(Datum::to_display_string).collect()),
        (Operator::In, [needle, Datum::String(haystack)]) => {
            Datum::Bool(haystack.contains(&needle.to_display_string()))
        }
        (Operator::In, [needle, Datum::Array(items)]) => {
            Datum::Bool(items.iter().any(|item| item.strict_eq(needle)))
        }
        // Arity is checked at parse time; anything left is an empty
        // min/max or `in` over a non-container.
        (Operator::In, _) => Datum::Bool(false),
        _ => Datum::Null,
    }
}

fn ordered(a: &Datum, b: &Datum, test: fn(Ordering) -> bool) -> Datum {
    Datum::Bool(a.compare(b).is_some_and(test))
}

fn extremum(values: &[Datum], pick: fn(f64, f64) -> f64) -> Datum {
    let numbers: Vec<f64> = values.iter().map(Datum::to_number).collect();
    if numbers.iter().any(|n| n.is_nan()) {
        return Datum::NAN;
    }
    numbers
        .into_iter()
        .reduce(pick)
        .map_or(Datum::Null, Datum::Number)
}

fn reduce(args: &[Rule], resolver: &mut dyn VarResolver) -> Result<Datum, LogicError> {
    let [source, body, rest @ ..] = args else {
        return Err(LogicError::MalformedRule(
            "'reduce' needs an array, a reducer, and an optional seed".into(),
        ));
    };
    let mut accumulator = match rest.first() {
        Some(seed) => evaluate(seed, resolver)?,
        None => Datum::Null,
    };
    let Datum::Array(items) = evaluate(source, resolver)? else {
        return Ok(accumulator);
    };
    for item in items {
        let mut frame = BTreeMap::new();
        frame.insert("current".to_string(), item);
        frame.insert("accumulator".to_string(), accumulator);
        let local = Datum::Object(frame);
        accumulator = evaluate(body, &mut DatumResolver(&local))?;
    }
    Ok(accumulator)
}

fn map_or_filter(
    op: Operator,
    args: &[Rule],
    resolver: &mut dyn VarResolver,
) -> Result<Datum, LogicError> {
    let [source, body] = args else {
        return Err(LogicError::MalformedRule(format!(
            "'{op}' needs an array and an expression"
        )));
    };
    let Datum::Array(items) = evaluate(source, resolver)? else {
        return Ok(Datum::Array(Vec::new()));
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let result = evaluate(body, &mut DatumResolver(&item))?;
        if op == Operator::Map {
            out.push(result);
        } else if result.truthy() {
            out.push(item);
        }
    }
    Ok(Datum::Array(out))
}

/// Parse and evaluate a JSON rule against plain data.
pub fn apply_rule(rule: &Value, data: &Value) -> Result<Datum, LogicError> {
    let rule = Rule::parse(rule)?;
    let data = Datum::from(data);
    evaluate(&rule, &mut DatumResolver(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn run(rule: Value, data: Value) -> Datum {
        apply_rule(&rule, &data).expect("rule evaluates")
    }

    #[rstest]
    #[case(json!({">": [3, 2]}), true)]
    #[case(json!({">=": [2, 2]}), true)]
    #[case(json!({"<": [1, 2, 3]}), true)]
    #[case(json!({"<": [1, 3, 3]}), false)]
    #[case(json!({"<=": [1, 3, 3]}), true)]
    #[case(json!({"==": [1, "1"]}), true)]
    #[case(json!({"===": [1, "1"]}), false)]
    #[case(json!({"!=": [1, 2]}), true)]
    #[case(json!({"!==": [1, 1]}), false)]
    #[case(json!({"!": [false]}), true)]
    #[case(json!({"!!": [[]]}), false)]
    #[case(json!({"in": ["ell", "hello"]}), true)]
    #[case(json!({"in": [2, [1, 2, 3]]}), true)]
    fn boolean_operators(#[case] rule: Value, #[case] expected: bool) {
        assert_eq!(run(rule, json!({})), Datum::Bool(expected));
    }

    #[rstest]
    #[case(json!({"+": [1, 2, "3"]}), 6.0)]
    #[case(json!({"*": [2, {"var": "a"}]}), 8.0)]
    #[case(json!({"-": [10, 4]}), 6.0)]
    #[case(json!({"-": [5]}), -5.0)]
    #[case(json!({"/": [9, 3]}), 3.0)]
    #[case(json!({"%": [10, 4]}), 2.0)]
    #[case(json!({"min": [3, 1, 2]}), 1.0)]
    #[case(json!({"max": [3, {"var": "a"}]}), 4.0)]
    fn arithmetic(#[case] rule: Value, #[case] expected: f64) {
        assert_eq!(run(rule, json!({"a": 4})), Datum::Number(expected));
    }

    #[test]
    fn missing_and_null_vars_are_nan() {
        assert!(matches!(run(json!({"var": "nope"}), json!({})), Datum::Number(n) if n.is_nan()));
        assert!(matches!(run(json!({"var": "a"}), json!({"a": null})), Datum::Number(n) if n.is_nan()));
        assert_eq!(
            run(json!({">": [{"var": "a"}, 1]}), json!({"a": null})),
            Datum::Bool(false)
        );
        assert_eq!(
            run(json!({"<=": [{"var": "a"}, 1]}), json!({})),
            Datum::Bool(false)
        );
    }

    #[test]
    fn var_default_applies_to_missing_values() {
        assert_eq!(run(json!({"var": ["a", 7]}), json!({})), Datum::Number(7.0));
        assert_eq!(run(json!({"var": ["a", 7]}), json!({"a": 1})), Datum::Number(1.0));
    }

    #[test]
    fn var_reads_dotted_paths_and_indices() {
        let data = json!({"person": {"pets": ["cat", "dog"]}});
        assert_eq!(
            run(json!({"var": "person.pets.1"}), data),
            Datum::String("dog".into())
        );
    }

    #[test]
    fn and_or_return_deciding_operand() {
        assert_eq!(run(json!({"and": [1, 0, 2]}), json!({})), Datum::Number(0.0));
        assert_eq!(run(json!({"or": [0, "", "x"]}), json!({})), Datum::String("x".into()));
        assert_eq!(run(json!({"&&": [true, true]}), json!({})), Datum::Bool(true));
    }

    #[test]
    fn if_chains_pick_first_truthy_branch() {
        let rule = json!({"if": [{"<": [{"var": "t"}, 0]}, "freezing", {"<": [{"var": "t"}, 100]}, "liquid", "gas"]});
        assert_eq!(run(rule.clone(), json!({"t": -5})), Datum::String("freezing".into()));
        assert_eq!(run(rule.clone(), json!({"t": 20})), Datum::String("liquid".into()));
        assert_eq!(run(rule, json!({"t": 200})), Datum::String("gas".into()));
    }

    #[test]
    fn reduce_folds_with_accumulator() {
        let rule = json!({
            "reduce": [
                {"var": "numbers"},
                {"+": [{"var": "current"}, {"var": "accumulator"}]},
                10
            ]
        });
        assert_eq!(run(rule, json!({"numbers": [1, 2, 3]})), Datum::Number(16.0));
    }

    #[test]
    fn reduce_over_non_array_returns_seed() {
        let rule = json!({"reduce": [{"var": "missing"}, {"var": "current"}, 0]});
        assert_eq!(run(rule, json!({})), Datum::Number(0.0));
    }

    #[test]
    fn map_and_filter_use_element_data() {
        let data = json!({"xs": [1, 2, 3, 4]});
        assert_eq!(
            run(json!({"map": [{"var": "xs"}, {"*": [{"var": ""}, 2]}]}), data.clone()),
            Datum::Array(vec![2.0.into(), 4.0.into(), 6.0.into(), 8.0.into()])
        );
        assert_eq!(
            run(json!({"filter": [{"var": "xs"}, {">": [{"var": ""}, 2]}]}), data),
            Datum::Array(vec![3.0.into(), 4.0.into()])
        );
    }

    #[test]
    fn cat_concatenates_display_strings() {
        assert_eq!(
            run(json!({"cat": ["Total: ", {"*": [2, 2]}, "!"]}), json!({})),
            Datum::String("Total: 4!".into())
        );
    }
}
