//! # Generic Value: The Loosely-Typed Data Model
//!
//! `Value` is the in-memory wire format of shapecast: everything the decoder
//! accepts and everything the encoder produces is one of these variants.
//! It mirrors the JSON data model with integers and floats kept apart, so
//! coercion rules can tell `42` from `42.0`.
//!
//! Conversion to and from `serde_json::Value` is lossless except for
//! unsigned integers above `i64::MAX`, which become `Float`, and non-finite
//! floats, which JSON cannot carry and which render as `null`.
//!
//! Deserializing accepts any self-describing format. Scalar mapping keys
//! (YAML allows `1: apple` or `true: yes`) are stored under their text form,
//! the same text [`Value::to_text`] produces.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Serialize;

/// A loosely-typed value: a scalar, an ordered sequence, or a string-keyed mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent or explicit null.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed 64-bit integer scalar.
    Int(i64),
    /// 64-bit floating point scalar.
    Float(f64),
    /// UTF-8 string scalar.
    String(String),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// Associative mapping with string keys, iterated in key order.
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is the zero value of its kind.
    ///
    /// A mapping is zero when every value in it is zero, matching the
    /// notion of an all-default record. An empty mapping is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Sequence(items) => items.is_empty(),
            Value::Mapping(map) => map.values().all(Value::is_zero),
        }
    }

    /// Returns true for a numeric zero (`0` or `0.0`).
    pub fn is_numeric_zero(&self) -> bool {
        match self {
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            _ => false,
        }
    }

    /// Returns the boolean if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as a float if this is an `Int` or a `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` if this is a `Mapping`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Default textual form of a scalar.
    ///
    /// `Null` renders as the empty string. Sequences and mappings have no
    /// textual form and return `None`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence or mapping")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        Ok(Value::Int(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        Ok(i64::try_from(n).map_or(Value::Float(n as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, item)) = map.next_entry::<Value, Value>()? {
            let text = key.to_text().ok_or_else(|| {
                de::Error::custom(format!("unsupported {} mapping key", key.kind_name()))
            })?;
            entries.insert(text, item);
        }
        Ok(Value::Mapping(entries))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Mapping(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 above i64::MAX, or a genuine float.
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(n) => serde_json::Value::from(n),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_values() {
        assert!(Value::Null.is_zero());
        assert!(Value::Bool(false).is_zero());
        assert!(Value::Int(0).is_zero());
        assert!(Value::Float(0.0).is_zero());
        assert!(Value::String(String::new()).is_zero());
        assert!(Value::Sequence(vec![]).is_zero());
        assert!(Value::Mapping(BTreeMap::new()).is_zero());

        assert!(!Value::Int(7).is_zero());
        assert!(!Value::from("x").is_zero());
        assert!(!Value::Sequence(vec![Value::Null]).is_zero());
    }

    #[test]
    fn test_mapping_zero_when_all_entries_zero() {
        let zero = Value::from(json!({"a": 0, "b": "", "c": {"d": false}}));
        assert!(zero.is_zero());

        let non_zero = Value::from(json!({"a": 0, "b": "x"}));
        assert!(!non_zero.is_zero());
    }

    #[test]
    fn test_from_json_keeps_int_float_apart() {
        assert_eq!(Value::from(json!(42)), Value::Int(42));
        assert_eq!(Value::from(json!(42.5)), Value::Float(42.5));
        assert_eq!(Value::from(json!(u64::MAX)), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn test_json_round_trip() {
        let original = json!({
            "name": "Alice",
            "age": 30,
            "score": 1.5,
            "tags": ["a", "b"],
            "active": true,
            "nothing": null
        });
        let back = serde_json::Value::from(Value::from(original.clone()));
        assert_eq!(back, original);
    }

    #[test]
    fn test_non_finite_float_renders_null() {
        assert_eq!(serde_json::Value::from(Value::Float(f64::NAN)), json!(null));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Int(42).to_text().as_deref(), Some("42"));
        assert_eq!(Value::Float(1.5).to_text().as_deref(), Some("1.5"));
        assert_eq!(Value::Bool(true).to_text().as_deref(), Some("true"));
        assert_eq!(Value::Null.to_text().as_deref(), Some(""));
        assert_eq!(Value::Sequence(vec![]).to_text(), None);
    }

    #[test]
    fn test_serde_untagged_deserialize() {
        let v: Value = serde_json::from_str(r#"{"a": [1, 2.5, "x", null, false]}"#).unwrap();
        let items = v.get("a").and_then(Value::as_sequence).unwrap();
        assert_eq!(items[0], Value::Int(1));
        assert_eq!(items[1], Value::Float(2.5));
        assert_eq!(items[2], Value::from("x"));
        assert_eq!(items[3], Value::Null);
        assert_eq!(items[4], Value::Bool(false));
    }

    #[test]
    fn test_scalar_mapping_keys_deserialize_as_text() {
        use serde::de::value::{Error, MapDeserializer};

        let entries = vec![(1u32, "apple"), (20, "pear")];
        let de = MapDeserializer::<_, Error>::new(entries.into_iter());
        let v = Value::deserialize(de).unwrap();
        assert_eq!(v.get("1"), Some(&Value::from("apple")));
        assert_eq!(v.get("20"), Some(&Value::from("pear")));

        let flags = vec![(true, 1i64)];
        let v = Value::deserialize(MapDeserializer::<_, Error>::new(flags.into_iter())).unwrap();
        assert_eq!(v.get("true"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_large_unsigned_deserializes_as_float() {
        let v: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(v, Value::Float(u64::MAX as f64));
    }

    #[test]
    fn test_display_is_compact_json() {
        let v = Value::from(json!({"b": 1, "a": [true]}));
        assert_eq!(v.to_string(), r#"{"a":[true],"b":1}"#);
    }
}
