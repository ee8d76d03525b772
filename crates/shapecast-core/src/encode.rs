//! # Generic Encoder
//!
//! Turns typed values into the generic [`Value`] model: records become
//! mappings keyed by lower-cased field identifiers, sequences and mappings
//! are converted element by element, optional values encode their content
//! or `Null`, and scalars pass through.
//!
//! Record encoding is best effort. A field that cannot be encoded is left
//! out of the mapping and the failure is recorded on the [`Encoder`] instead
//! of aborting the whole record. Failures of the top-level value itself
//! (e.g. a function) are returned as errors.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::describe::Encode;
use crate::error::EncodeError;
use crate::value::Value;

/// Encoding context. Collects field-level diagnostics across one encode pass.
#[derive(Debug, Default)]
pub struct Encoder {
    diagnostics: Vec<EncodeError>,
}

impl Encoder {
    /// Creates an encoder with no diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `value`, keeping diagnostics from earlier calls.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<Value, EncodeError> {
        value.encode(self)
    }

    /// Encodes one record field into `record` under its lower-cased identifier.
    ///
    /// On failure the key is omitted and the error is kept as a diagnostic.
    pub fn field<T: Encode + ?Sized>(
        &mut self,
        record: &mut BTreeMap<String, Value>,
        ident: &str,
        value: &T,
    ) {
        match value.encode(self) {
            Ok(encoded) => {
                record.insert(ident.to_lowercase(), encoded);
            }
            Err(err) => {
                tracing::debug!(field = ident, error = %err, "field left out of encoded record");
                self.diagnostics.push(EncodeError::Field {
                    field: ident.to_string(),
                    source: Box::new(err),
                });
            }
        }
    }

    /// Field-level failures collected so far.
    pub fn diagnostics(&self) -> &[EncodeError] {
        &self.diagnostics
    }

    /// Takes the collected diagnostics, leaving the encoder empty.
    pub fn take_diagnostics(&mut self) -> Vec<EncodeError> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// Encodes a single value.
///
/// # Errors
///
/// Returns `EncodeError::Unsupported` for function values and
/// `EncodeError::OutOfRange` for unsigned integers above `i64::MAX`, unless
/// they sit inside a record field, in which case the field is skipped.
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Value, EncodeError> {
    Encoder::new().encode(value)
}

/// Encodes a batch of values.
///
/// A single input yields its own generic value; several inputs yield a
/// sequence of generic values in input order.
///
/// # Errors
///
/// Every value is attempted. If any fail, their errors are returned together
/// as `EncodeError::Combined`.
pub fn encode_all(values: &[&dyn Encode]) -> Result<Value, EncodeError> {
    let mut encoder = Encoder::new();
    let mut encoded = Vec::with_capacity(values.len());
    let mut failures = Vec::new();

    for value in values {
        match value.encode(&mut encoder) {
            Ok(v) => encoded.push(v),
            Err(err) => failures.push(err),
        }
    }

    if !failures.is_empty() {
        return Err(EncodeError::Combined(failures));
    }
    if encoded.len() == 1 {
        return Ok(encoded.remove(0));
    }
    Ok(Value::Sequence(encoded))
}

/// Encodes a batch of values and renders the result as tab-indented JSON text.
pub fn encode_to_json(values: &[&dyn Encode]) -> Result<String, EncodeError> {
    let value = encode_all(values)?;
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Point {
        x: i64,
        label: Option<String>,
        handler: fn() -> i32,
    }

    impl Encode for Point {
        fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
            let mut record = BTreeMap::new();
            encoder.field(&mut record, "X", &self.x);
            encoder.field(&mut record, "label", &self.label);
            encoder.field(&mut record, "handler", &self.handler);
            Ok(Value::Mapping(record))
        }
    }

    fn seven() -> i32 {
        7
    }

    fn point() -> Point {
        Point {
            x: 3,
            label: None,
            handler: seven,
        }
    }

    #[test]
    fn test_record_keys_are_lower_cased() {
        let value = encode(&point()).unwrap();
        assert_eq!(value.get("x"), Some(&Value::Int(3)));
        assert_eq!(value.get("label"), Some(&Value::Null));
    }

    #[test]
    fn test_failing_field_is_skipped_and_recorded() {
        let mut encoder = Encoder::new();
        let value = encoder.encode(&point()).unwrap();
        assert!(value.get("handler").is_none());
        assert_eq!(encoder.diagnostics().len(), 1);
        assert!(encoder.diagnostics()[0].to_string().contains("handler"));
    }

    #[test]
    fn test_function_value_is_hard_failure() {
        let f: fn() -> i32 = seven;
        assert!(matches!(
            encode(&f),
            Err(EncodeError::Unsupported { kind: "func" })
        ));
    }

    #[test]
    fn test_nested_containers() {
        let mut scores = HashMap::new();
        scores.insert(1u32, vec![1.5f64, 2.0]);
        let value = encode(&scores).unwrap();
        assert_eq!(
            value.get("1"),
            Some(&Value::Sequence(vec![Value::Float(1.5), Value::Float(2.0)]))
        );
    }

    #[test]
    fn test_encode_all_single_and_many() {
        assert_eq!(encode_all(&[&5i32]).unwrap(), Value::Int(5));
        assert_eq!(
            encode_all(&[&5i32, &"a"]).unwrap(),
            Value::Sequence(vec![Value::Int(5), Value::from("a")])
        );
    }

    #[test]
    fn test_encode_all_combines_failures() {
        let f: fn() -> i32 = seven;
        let err = encode_all(&[&1i32, &f, &u64::MAX]).unwrap_err();
        match err {
            EncodeError::Combined(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected combined error, got {other}"),
        }
    }

    #[test]
    fn test_encode_to_json_uses_tabs() {
        let text = encode_to_json(&[&point()]).unwrap();
        assert!(text.contains("\n\t\"label\": null"));
        assert!(text.contains("\"x\": 3"));
    }
}
