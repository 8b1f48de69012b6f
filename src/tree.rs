//! # Configuration Trees
//!
//! Index mappings and settings are arbitrary nested documents. This module
//! models them as a tagged variant type instead of a dynamically typed value,
//! so code walking two trees at once can match on their shapes:
//!
//! - **`Scalar`**: a leaf (`bool`, integer, float or string).
//! - **`Tree`**: an ordered map from string keys to values.
//! - **`Sequence`**: an ordered list of values.
//!
//! Trees are ordered by key (`BTreeMap`), which keeps every walk over them,
//! and therefore every change list derived from them, stable across runs.
//!
//! Conversion goes through `serde_json::Value`, so both the YAML loader and
//! the store's JSON responses produce the same representation. JSON `null`
//! has no counterpart: a key holding `null` is treated as absent and a
//! `null` sequence element is dropped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A nested mapping from string keys to values.
pub type Tree = BTreeMap<String, Value>;

/// A leaf value.
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Numeric view of the scalar, used to compare integers with floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            // 256 and 256.0 are the same setting whichever parser produced them
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

/// A node in a configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    Scalar(Scalar),
    Tree(Tree),
    Sequence(Vec<Value>),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Tree(_) => "tree",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Value::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut Tree> {
        match self {
            Value::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Consume the value, keeping it only if it is a tree.
    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Value::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Convert a JSON document into a tree.
    ///
    /// Anything that is not a JSON object yields an empty tree.
    pub fn tree_from_json(json: serde_json::Value) -> Tree {
        Value::from(json).into_tree().unwrap_or_default()
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        Value::Tree(tree)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

fn number_to_scalar(n: &serde_json::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Int(i)
    } else {
        // u64 beyond i64::MAX and real floats
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Tree(Tree::new()),
            Json::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            Json::Number(n) => Value::Scalar(number_to_scalar(&n)),
            Json::String(s) => Value::Scalar(Scalar::String(s)),
            Json::Array(items) => Value::Sequence(
                items
                    .into_iter()
                    .filter(|item| !item.is_null())
                    .map(Value::from)
                    .collect(),
            ),
            Json::Object(map) => Value::Tree(
                map.into_iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Value::Scalar(Scalar::Bool(b)) => Json::Bool(b),
            Value::Scalar(Scalar::Int(i)) => Json::from(i),
            Value::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Scalar(Scalar::String(s)) => Json::String(s),
            Value::Sequence(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            Value::Tree(tree) => Json::Object(
                tree.into_iter()
                    .map(|(k, v)| (k, Json::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Convert a tree into a JSON object, e.g. for a request body.
pub fn tree_to_json(tree: &Tree) -> serde_json::Value {
    serde_json::Value::from(Value::Tree(tree.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_builds_nested_tree() {
        let value = Value::from(json!({
            "properties": {
                "id": {"type": "integer"},
                "tags": ["a", "b"]
            }
        }));

        let tree = value.as_tree().unwrap();
        let properties = tree["properties"].as_tree().unwrap();
        assert_eq!(
            properties["id"].as_tree().unwrap()["type"],
            Value::from("integer")
        );
        assert_eq!(
            properties["tags"],
            Value::Sequence(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_null_keys_are_dropped() {
        let tree = Value::tree_from_json(json!({"a": null, "b": 1, "c": [null, 2]}));
        assert!(!tree.contains_key("a"));
        assert_eq!(tree["b"], Value::from(1_i64));
        assert_eq!(tree["c"], Value::Sequence(vec![Value::from(2_i64)]));
    }

    #[test]
    fn test_int_and_float_compare_numerically() {
        assert_eq!(Scalar::Int(256), Scalar::Float(256.0));
        assert_ne!(Scalar::Int(256), Scalar::Float(256.5));
        assert_ne!(Scalar::Int(1), Scalar::String("1".to_string()));
        assert_ne!(Scalar::Bool(true), Scalar::String("true".to_string()));
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Int(5).to_string(), "5");
        assert_eq!(Scalar::Float(256.0).to_string(), "256");
        assert_eq!(Scalar::Bool(false).to_string(), "false");
        assert_eq!(Scalar::String("1s".to_string()).to_string(), "1s");
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let value: Value = serde_yaml::from_str(
            "number_of_shards: 5\nrefresh_interval: 1s\nratio: 0.5\nenabled: true\n",
        )
        .unwrap();
        let tree = value.into_tree().unwrap();
        assert_eq!(tree["number_of_shards"], Value::from(5_i64));
        assert_eq!(tree["refresh_interval"], Value::from("1s"));
        assert_eq!(tree["ratio"], Value::Scalar(Scalar::Float(0.5)));
        assert_eq!(tree["enabled"], Value::from(true));
    }

    #[test]
    fn test_serialize_roundtrips_through_json() {
        let original = json!({"index": {"number_of_shards": 1, "analysis": {"filter": ["lowercase"]}}});
        let value = Value::from(original.clone());
        assert_eq!(serde_json::to_value(&value).unwrap(), original);
    }

    #[test]
    fn test_non_object_json_yields_empty_tree() {
        assert!(Value::tree_from_json(json!("scalar")).is_empty());
        assert!(Value::tree_from_json(json!(null)).is_empty());
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(Value::from(1_i64).shape(), "scalar");
        assert_eq!(Value::Tree(Tree::new()).shape(), "tree");
        assert_eq!(Value::Sequence(vec![]).shape(), "sequence");
    }
}
