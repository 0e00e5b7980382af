//! Differential check against the `jsonschema` crate.
//!
//! For schemas that only use plain JSON Schema keywords, hform and the
//! reference validator must agree on whether each instance is valid.

use hform_schema::{ValidationOptions, validate_schema};
use serde_json::{Value, json};

const DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

fn with_dialect(schema: &Value) -> Value {
    let mut schema = schema.clone();
    if let Value::Object(map) = &mut schema {
        map.insert("$schema".into(), json!(DIALECT));
    }
    schema
}

fn cases() -> Vec<(Value, Vec<Value>)> {
    vec![
        (
            json!({"type": ["string", "null"], "minLength": 2, "maxLength": 4, "pattern": "^[a-z]"}),
            vec![json!(null), json!("ab"), json!("a"), json!("abcde"), json!("Ab"), json!(3)],
        ),
        (
            json!({"type": "integer", "minimum": 0, "exclusiveMaximum": 10, "multipleOf": 3}),
            vec![json!(0), json!(3), json!(9), json!(10), json!(-3), json!(4), json!(2.5)],
        ),
        (
            json!({"type": "number", "exclusiveMinimum": 1, "maximum": 2}),
            vec![json!(1), json!(1.5), json!(2), json!(2.01)],
        ),
        (
            json!({"enum": ["a", 1, null, {"k": [1, 2]}]}),
            vec![json!("a"), json!(1), json!(null), json!({"k": [1, 2]}), json!({"k": [2, 1]}), json!("b")],
        ),
        (
            json!({"const": {"x": [true, {"y": null}]}}),
            vec![json!({"x": [true, {"y": null}]}), json!({"x": [true]}), json!(null)],
        ),
        (
            json!({
                "type": "object",
                "required": ["id"],
                "properties": {"id": {"type": "integer"}, "tags": {"type": "array"}},
                "additionalProperties": false
            }),
            vec![
                json!({"id": 1}),
                json!({"id": 1, "tags": []}),
                json!({"tags": []}),
                json!({"id": 1, "extra": true}),
                json!({"id": "1"}),
                json!([]),
            ],
        ),
        (
            json!({"properties": {"a": {}}, "additionalProperties": {"type": "boolean"}}),
            vec![json!({"a": 1, "b": true}), json!({"a": 1, "b": "no"}), json!({})],
        ),
        (
            json!({
                "type": "array",
                "minItems": 1,
                "maxItems": 4,
                "uniqueItems": true,
                "prefixItems": [{"type": "string"}],
                "items": {"type": "integer"}
            }),
            vec![
                json!(["a", 1, 2]),
                json!(["a", 1, 1]),
                json!([]),
                json!(["a", 1, 2, 3, 4]),
                json!([1, 2]),
                json!(["a", "b"]),
            ],
        ),
        (
            json!({"contains": {"type": "string"}, "minContains": 2, "maxContains": 3}),
            vec![json!(["a"]), json!(["a", "b"]), json!(["a", "b", "c", "d"]), json!([1, "a", 2, "b"]), json!("not an array")],
        ),
        (
            json!({"allOf": [{"type": "string"}, {"minLength": 3}]}),
            vec![json!("abc"), json!("ab"), json!(123)],
        ),
        (
            json!({"anyOf": [{"type": "string"}, {"type": "number", "minimum": 10}]}),
            vec![json!("x"), json!(12), json!(3), json!(null)],
        ),
        (
            json!({"oneOf": [{"type": "integer"}, {"type": "number", "minimum": 5}]}),
            vec![json!(1), json!(7), json!(5.5), json!(2.5)],
        ),
        (
            json!({"not": {"type": "object"}}),
            vec![json!({}), json!([]), json!("x")],
        ),
        (
            json!({"not": {"not": {}}}),
            vec![json!({}), json!(1), json!(null)],
        ),
        (
            json!({
                "type": "object",
                "properties": {"country": {"type": "string"}, "postcode": {"type": "string"}},
                "if": {"properties": {"country": {"const": "NL"}}, "required": ["country"]},
                "then": {"properties": {"postcode": {"pattern": "^[0-9]{4}[A-Z]{2}$"}}},
                "else": {"properties": {"postcode": {"maxLength": 10}}}
            }),
            vec![
                json!({"country": "NL", "postcode": "1234AB"}),
                json!({"country": "NL", "postcode": "12345"}),
                json!({"country": "US", "postcode": "12345"}),
                json!({"country": "US", "postcode": "12345-6789-000"}),
                json!({"postcode": "x"}),
            ],
        ),
        (
            json!({"items": {"if": {"type": "string"}, "then": {"minLength": 2}, "else": {"minimum": 0}}}),
            vec![json!(["ab", 1]), json!(["a"]), json!([-1]), json!([])],
        ),
        (json!(true), vec![json!(1), json!(null)]),
        (json!(false), vec![json!(1), json!(null)]),
    ]
}

#[test]
fn validity_agrees_with_reference_validator() {
    for (schema, instances) in cases() {
        let reference = jsonschema::validator_for(&with_dialect(&schema)).expect("reference compiles schema");
        for instance in instances {
            let ours = validate_schema(&instance, &schema, &ValidationOptions::default())
                .expect("schema is well formed");
            assert_eq!(
                ours.is_empty(),
                reference.is_valid(&instance),
                "schema {schema} instance {instance}: {ours:?}"
            );
        }
    }
}
