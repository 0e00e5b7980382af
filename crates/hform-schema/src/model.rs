//! Typed schema model.
//!
//! A schema is read once into [`Schema`]: every keyword the validator
//! understands becomes a typed field, `pattern` is compiled, and unknown
//! `type` names are rejected. Keywords the validator does not act on
//! (`title`, `description`, `default`, ...) stay only in
//! [`SchemaObject::source`], which is what errors report as their schema.

use std::fmt;

use hform_core::is_integral;
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::error::SchemaError;

static TRUE_SCHEMA: Value = Value::Bool(true);
static FALSE_SCHEMA: Value = Value::Bool(false);

#[derive(Debug, Clone)]
pub enum Schema {
    /// `true` accepts everything, `false` rejects everything.
    Bool(bool),
    Object(Box<SchemaObject>),
}

impl Schema {
    /// Read a schema from JSON.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        Self::deserialize(value).map_err(|e| SchemaError::invalid("#", e))
    }

    /// The JSON this schema was read from.
    #[must_use]
    pub fn source(&self) -> &Value {
        match self {
            Self::Bool(true) => &TRUE_SCHEMA,
            Self::Bool(false) => &FALSE_SCHEMA,
            Self::Object(object) => &object.source,
        }
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = Value::deserialize(deserializer)?;
        match source {
            Value::Bool(accept) => Ok(Self::Bool(accept)),
            Value::Object(_) => {
                let mut object = SchemaObject::deserialize(&source).map_err(de::Error::custom)?;
                object.source = source;
                Ok(Self::Object(Box::new(object)))
            }
            other => Err(de::Error::custom(format!(
                "a schema must be an object or a boolean, got {}",
                hform_core::type_name(&other)
            ))),
        }
    }
}

/// An object schema. Absent keywords are `None` or empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    #[serde(rename = "type", default)]
    pub types: Option<TypeSet>,
    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "const", default, deserialize_with = "present")]
    pub const_value: Option<Value>,

    pub min_length: Option<Number>,
    pub max_length: Option<Number>,
    #[serde(default, deserialize_with = "compile_pattern")]
    pub pattern: Option<Regex>,
    pub format: Option<String>,

    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub multiple_of: Option<Number>,

    pub min_items: Option<Number>,
    pub max_items: Option<Number>,
    #[serde(default)]
    pub unique_items: bool,
    #[serde(default)]
    pub prefix_items: Vec<Schema>,
    pub items: Option<Schema>,
    pub contains: Option<Schema>,
    pub min_contains: Option<Number>,
    pub max_contains: Option<Number>,

    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
    pub additional_properties: Option<Schema>,

    #[serde(default)]
    pub all_of: Vec<Schema>,
    pub any_of: Option<Vec<Schema>>,
    pub one_of: Option<Vec<Schema>>,
    pub not: Option<Schema>,
    #[serde(rename = "if")]
    pub if_schema: Option<Schema>,
    #[serde(rename = "then")]
    pub then_schema: Option<Schema>,
    #[serde(rename = "else")]
    pub else_schema: Option<Schema>,

    /// Raw `logic` registry. Parsed when the node opens a rule scope.
    pub logic: Option<Value>,
    #[serde(rename = "logic-validations", default)]
    pub logic_validations: Vec<String>,

    #[serde(skip)]
    pub source: Value,
}

impl SchemaObject {
    pub fn property_names(&self) -> impl Iterator<Item = String> + '_ {
        self.properties.names().map(str::to_string)
    }
}

/// `properties` in the order the schema lists them.
#[derive(Debug, Clone, Default)]
pub struct Properties(Vec<(String, Schema)>);

impl Properties {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, schema)| schema)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.0.iter().map(|(key, schema)| (key.as_str(), schema))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer)?
            .into_iter()
            .map(|(name, raw)| {
                Schema::deserialize(&raw)
                    .map(|schema| (name.clone(), schema))
                    .map_err(|e| <D::Error as de::Error>::custom(format!("property '{name}': {e}")))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

/// `const: null` must read as `Some(Null)`, not as an absent keyword.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn compile_pattern<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Regex>, D::Error> {
    let source = String::deserialize(deserializer)?;
    Regex::new(&source)
        .map(Some)
        .map_err(|e| de::Error::custom(format!("invalid pattern '{source}': {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl InstanceType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::String => "string",
            Self::Integer => "integer",
        }
    }

    /// Integral floats such as `10.0` count as `integer`.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Integer => matches!(value, Value::Number(n) if is_integral(n)),
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `type` as written: one name or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(InstanceType),
    Many(Vec<InstanceType>),
}

impl TypeSet {
    #[must_use]
    pub fn as_slice(&self) -> &[InstanceType] {
        match self {
            Self::Single(single) => std::slice::from_ref(single),
            Self::Many(many) => many,
        }
    }

    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        self.as_slice().iter().any(|ty| ty.matches(value))
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .as_slice()
            .iter()
            .map(|ty| ty.as_str())
            .collect::<Vec<_>>();
        f.write_str(&names.join(","))
    }
}
