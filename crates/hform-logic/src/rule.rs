//! Parsed JSON-logic expressions.
//!
//! A rule arrives as JSON (`{"op": [args...]}`) and is parsed once into a
//! [`Rule`] tree over a closed [`Operator`] set. Unknown operators are
//! rejected at parse time.

use std::fmt;

use serde_json::Value;

use crate::error::LogicError;

/// Every operator the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Var,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
    StrictEqual,
    NotEqual,
    StrictNotEqual,
    Not,
    Truthy,
    And,
    Or,
    If,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Min,
    Max,
    Cat,
    In,
    Reduce,
    Map,
    Filter,
}

impl Operator {
    /// Look an operator up by its JSON name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "var" => Self::Var,
            ">" => Self::Greater,
            ">=" => Self::GreaterOrEqual,
            "<" => Self::Less,
            "<=" => Self::LessOrEqual,
            "==" => Self::Equal,
            "===" => Self::StrictEqual,
            "!=" => Self::NotEqual,
            "!==" => Self::StrictNotEqual,
            "!" => Self::Not,
            "!!" => Self::Truthy,
            "and" | "&&" => Self::And,
            "or" | "||" => Self::Or,
            "if" | "?:" => Self::If,
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "%" => Self::Modulo,
            "min" => Self::Min,
            "max" => Self::Max,
            "cat" => Self::Cat,
            "in" => Self::In,
            "reduce" => Self::Reduce,
            "map" => Self::Map,
            "filter" => Self::Filter,
            _ => return None,
        };
        Some(op)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
            Self::StrictEqual => "===",
            Self::NotEqual => "!=",
            Self::StrictNotEqual => "!==",
            Self::Not => "!",
            Self::Truthy => "!!",
            Self::And => "and",
            Self::Or => "or",
            Self::If => "if",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Min => "min",
            Self::Max => "max",
            Self::Cat => "cat",
            Self::In => "in",
            Self::Reduce => "reduce",
            Self::Map => "map",
            Self::Filter => "filter",
        }
    }

    /// Operators whose later arguments run against per-element data
    /// instead of the enclosing scope.
    #[must_use]
    pub const fn iterates(self) -> bool {
        matches!(self, Self::Reduce | Self::Map | Self::Filter)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Literal(Value),
    Array(Vec<Rule>),
    Var {
        path: Box<Rule>,
        default: Option<Box<Rule>>,
    },
    Operation { op: Operator, args: Vec<Rule> },
}

impl Rule {
    /// Parse a JSON expression.
    ///
    /// Objects with exactly one key are operations; other objects and all
    /// scalars are literals.
    pub fn parse(value: &Value) -> Result<Self, LogicError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            Value::Object(map) if map.len() == 1 => {
                let Some((name, raw_args)) = map.iter().next() else {
                    return Ok(Self::Literal(value.clone()));
                };
                let op = Operator::from_name(name)
                    .ok_or_else(|| LogicError::UnsupportedOperator(name.clone()))?;
                let args = match raw_args {
                    Value::Array(items) => items
                        .iter()
                        .map(Self::parse)
                        .collect::<Result<Vec<_>, _>>()?,
                    other => vec![Self::parse(other)?],
                };
                Self::operation(op, args)
            }
            _ => Ok(Self::Literal(value.clone())),
        }
    }

    fn operation(op: Operator, mut args: Vec<Self>) -> Result<Self, LogicError> {
        if op == Operator::Var {
            if args.len() > 2 {
                return Err(LogicError::MalformedRule(format!(
                    "'var' takes a path and an optional default, got {} arguments",
                    args.len()
                )));
            }
            let default = (args.len() == 2).then(|| Box::new(args.remove(1)));
            let path = args
                .pop()
                .unwrap_or_else(|| Self::Literal(Value::String(String::new())));
            return Ok(Self::Var {
                path: Box::new(path),
                default,
            });
        }

        let arity_ok = match op {
            Operator::Divide | Operator::Modulo | Operator::In => args.len() == 2,
            Operator::Greater | Operator::GreaterOrEqual => args.len() == 2,
            Operator::Less | Operator::LessOrEqual => matches!(args.len(), 2 | 3),
            Operator::Equal
            | Operator::StrictEqual
            | Operator::NotEqual
            | Operator::StrictNotEqual => args.len() == 2,
            Operator::Not | Operator::Truthy => args.len() == 1,
            Operator::Subtract => matches!(args.len(), 1 | 2),
            Operator::Reduce => matches!(args.len(), 2 | 3),
            Operator::Map | Operator::Filter => args.len() == 2,
            _ => true,
        };
        if !arity_ok {
            return Err(LogicError::MalformedRule(format!(
                "operator '{op}' does not accept {} arguments",
                args.len()
            )));
        }
        Ok(Self::Operation { op, args })
    }

    /// Statically known `var` paths evaluated against the enclosing scope.
    ///
    /// Paths inside the per-element arguments of `reduce`/`map`/`filter`
    /// are excluded (they read element data), as are computed paths.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Array(items) => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            Self::Var { path, default } => {
                match path.as_ref() {
                    Self::Literal(Value::String(name)) => push_unique(out, name.clone()),
                    Self::Literal(Value::Number(n)) => push_unique(out, n.to_string()),
                    other => other.collect_variables(out),
                }
                if let Some(default) = default {
                    default.collect_variables(out);
                }
            }
            Self::Operation { op, args } if op.iterates() => {
                // The source array and the reduce seed read the enclosing scope.
                if let Some(source) = args.first() {
                    source.collect_variables(out);
                }
                if *op == Operator::Reduce {
                    if let Some(seed) = args.get(2) {
                        seed.collect_variables(out);
                    }
                }
            }
            Self::Operation { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: String) {
    if !out.contains(&name) {
        out.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_nested_operations() {
        let rule = Rule::parse(&json!({">": [{"var": "field_a"}, {"var": "field_b"}]})).unwrap();
        let Rule::Operation { op, args } = rule else {
            panic!("expected operation");
        };
        assert_eq!(op, Operator::Greater);
        assert_eq!(args.len(), 2);
        assert!(matches!(args[0], Rule::Var { .. }));
    }

    #[test]
    fn single_argument_shorthand() {
        let rule = Rule::parse(&json!({"var": "age"})).unwrap();
        assert_eq!(rule.variables(), vec!["age".to_string()]);
        let rule = Rule::parse(&json!({"!": {"var": "flag"}})).unwrap();
        assert_eq!(rule.variables(), vec!["flag".to_string()]);
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = Rule::parse(&json!({"sqrt": [4]})).unwrap_err();
        assert_eq!(err, LogicError::UnsupportedOperator("sqrt".into()));
    }

    #[test]
    fn nested_unknown_operator_is_rejected() {
        let err = Rule::parse(&json!({"and": [true, {"log": "x"}]})).unwrap_err();
        assert_eq!(err, LogicError::UnsupportedOperator("log".into()));
    }

    #[test]
    fn wrong_arity_is_malformed() {
        assert!(matches!(
            Rule::parse(&json!({"/": [1, 2, 3]})),
            Err(LogicError::MalformedRule(_))
        ));
        assert!(matches!(
            Rule::parse(&json!({"var": ["a", 1, 2]})),
            Err(LogicError::MalformedRule(_))
        ));
    }

    #[test]
    fn multi_key_objects_are_literals() {
        let rule = Rule::parse(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(rule, Rule::Literal(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn reduce_body_variables_are_local() {
        let rule = Rule::parse(&json!({
            "reduce": [
                {"var": "items"},
                {"+": [{"var": "current"}, {"var": "accumulator"}]},
                {"var": "start"}
            ]
        }))
        .unwrap();
        assert_eq!(
            rule.variables(),
            vec!["items".to_string(), "start".to_string()]
        );
    }

    #[test]
    fn variables_are_deduplicated() {
        let rule = Rule::parse(&json!({"*": [{"var": "a"}, {"var": "a"}, {"var": ["b", 0]}]}))
            .unwrap();
        assert_eq!(rule.variables(), vec!["a".to_string(), "b".to_string()]);
    }
}
