// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Native values produced by [`Document::to_native`](crate::Document::to_native)
//! and accepted by [`stringify`](crate::stringify).

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use num_bigint::BigInt;
use ordermap::OrderMap;
use serde::ser::{SerializeMap as _, SerializeSeq as _};

use crate::document::{Node, Pair, Scalar, ScalarValue, Timestamp, YamlMap, YamlSeq};

/// A plain data value with no YAML presentation details.
///
/// Map keys are strings: non-string keys are rendered to text on conversion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(Timestamp),
    Seq(Vec<Value>),
    Map(OrderMap<String, Value>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a map entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Null => Self::Null,
            ScalarValue::Bool(b) => Self::Bool(b),
            ScalarValue::Int(i) => Self::Int(i),
            ScalarValue::BigInt(i) => Self::BigInt(i),
            ScalarValue::Float(f) => Self::Float(f),
            ScalarValue::Str(s) => Self::String(s),
            ScalarValue::Binary(b) => Self::Binary(b),
            ScalarValue::Timestamp(t) => Self::Timestamp(t),
        }
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        let scalar = |v: ScalarValue| Self::Scalar(Scalar::new(v));
        match value {
            Value::Null => scalar(ScalarValue::Null),
            Value::Bool(b) => scalar(ScalarValue::Bool(*b)),
            Value::Int(i) => scalar(ScalarValue::Int(*i)),
            Value::BigInt(i) => scalar(ScalarValue::BigInt(i.clone())),
            Value::Float(f) => scalar(ScalarValue::Float(*f)),
            Value::String(s) => scalar(ScalarValue::Str(s.clone())),
            Value::Binary(b) => scalar(ScalarValue::Binary(b.clone())),
            Value::Timestamp(t) => scalar(ScalarValue::Timestamp(*t)),
            Value::Seq(items) => Self::Seq(YamlSeq {
                items: items.iter().map(Self::from).collect(),
                ..YamlSeq::default()
            }),
            Value::Map(entries) => Self::Map(YamlMap {
                items: entries
                    .iter()
                    .map(|(k, v)| Pair::new(k.as_str(), Self::from(v)))
                    .collect(),
                ..YamlMap::default()
            }),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Ok(big) = n.to_string().parse::<BigInt>() {
                    Self::BigInt(big)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Seq(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::BigInt(i) => match i128::try_from(i) {
                Ok(small) => serializer.serialize_i128(small),
                Err(_) => serializer.serialize_str(&i.to_string()),
            },
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Binary(b) => serializer.serialize_str(&B64.encode(b)),
            Self::Timestamp(t) => serializer.serialize_str(&t.to_iso()),
            Self::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"a": [1, 2.5, "x", null, true]}));
        let Value::Map(map) = &value else {
            panic!("expected map");
        };
        let Some(Value::Seq(items)) = map.get("a") else {
            panic!("expected seq");
        };
        assert_eq!(
            items,
            &vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::String("x".into()),
                Value::Null,
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn test_big_json_number() {
        let value: serde_json::Value =
            serde_json::from_str("123456789012345678901234567890").unwrap();
        let value = Value::from(value);
        assert!(matches!(value, Value::BigInt(_)));
    }

    #[test]
    fn test_serialize_to_json() {
        let value = Value::from(json!({"b": [1, "two"], "a": null}));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"b":[1,"two"],"a":null}"#
        );
        let bin = Value::Binary(b"hi".to_vec());
        assert_eq!(serde_json::to_string(&bin).unwrap(), r#""aGk=""#);
    }

    #[test]
    fn test_node_from_value() {
        let node = Node::from(&Value::from(json!({"k": [true]})));
        let map = node.as_map().unwrap();
        assert_eq!(map.items.len(), 1);
        let seq = map.get(&"k".into()).and_then(Node::as_seq).unwrap();
        assert_eq!(seq.items[0].scalar_value(), Some(&ScalarValue::Bool(true)));
    }
}
