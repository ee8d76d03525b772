//! # Type Descriptions
//!
//! Static descriptions of the Rust types that take part in schema
//! compilation. Instead of inspecting values at run time, every participating
//! type states its structure through [`Describe::shape`]: a scalar kind, an
//! ordered list of annotated fields, a sequence, a mapping, or an optional
//! (pointer-like) wrapper.
//!
//! Nested shapes are stored as `fn() -> Shape` so a description is built one
//! level at a time. The schema compiler walks them lazily and can stop at a
//! depth limit instead of recursing forever on a self-referential type.
//!
//! Records get their description from `#[derive(Describe)]`; the impls below
//! cover the standard scalars and containers.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::encode::Encoder;
use crate::error::{AssembleError, EncodeError};
use crate::value::Value;

/// Target kind of a scalar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// A single character, carried as a one-character string.
    Char,
    String,
    /// Accepts any generic value unchanged.
    Any,
}

impl ScalarKind {
    /// Returns the kind name used in diagnostics and schema rendering.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "string",
            ScalarKind::Any => "any",
        }
    }

    /// Inclusive integer range for integer kinds, clamped to what `Value::Int` holds.
    pub fn int_range(&self) -> Option<(i64, i64)> {
        match self {
            ScalarKind::I8 => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            ScalarKind::I16 => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            ScalarKind::I32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            ScalarKind::I64 => Some((i64::MIN, i64::MAX)),
            ScalarKind::U8 => Some((0, i64::from(u8::MAX))),
            ScalarKind::U16 => Some((0, i64::from(u16::MAX))),
            ScalarKind::U32 => Some((0, i64::from(u32::MAX))),
            ScalarKind::U64 => Some((0, i64::MAX)),
            _ => None,
        }
    }

    /// Returns true for the integer kinds.
    pub fn is_integer(&self) -> bool {
        self.int_range().is_some()
    }

    /// Returns true for `F32` and `F64`.
    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    /// Zero value of this kind in the generic model.
    pub fn zero(&self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::F32 | ScalarKind::F64 => Value::Float(0.0),
            ScalarKind::Char | ScalarKind::String => Value::String(String::new()),
            ScalarKind::Any => Value::Null,
            _ => Value::Int(0),
        }
    }
}

/// Static structure of a type.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A single scalar value.
    Scalar(ScalarKind),
    /// A record of named fields.
    Aggregate(AggregateShape),
    /// An ordered, homogeneous collection.
    Sequence(fn() -> Shape),
    /// A string-keyed associative collection.
    Mapping {
        key: fn() -> Shape,
        value: fn() -> Shape,
    },
    /// A value that may be absent (`Option`): decoded by reference-or-absent.
    Optional(fn() -> Shape),
    /// A function value. Never representable as data.
    Callable,
}

impl Shape {
    /// Short kind name, used when rendering schemas and in compile errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Scalar(kind) => kind.name(),
            Shape::Aggregate(_) => "struct",
            Shape::Sequence(_) => "slice",
            Shape::Mapping { .. } => "map",
            Shape::Optional(_) => "ptr",
            Shape::Callable => "func",
        }
    }
}

/// Field list of a record type, in declaration order.
#[derive(Debug, Clone)]
pub struct AggregateShape {
    /// Rust type name.
    pub name: &'static str,
    /// Declared fields.
    pub fields: Vec<FieldShape>,
}

/// One declared record field.
#[derive(Debug, Clone)]
pub struct FieldShape {
    /// Field identifier as written in the source.
    pub ident: &'static str,
    /// Annotation strings keyed by namespace, e.g. `("cast", "name=id,required")`.
    pub tags: &'static [(&'static str, &'static str)],
    /// Shape of the field type.
    pub shape: fn() -> Shape,
}

impl FieldShape {
    /// Returns the annotation string for `namespace`, if any.
    pub fn options(&self, namespace: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(ns, _)| *ns == namespace)
            .map(|(_, opts)| *opts)
    }

    /// Key under which the encoder stores this field: the lower-cased identifier.
    pub fn key(&self) -> String {
        self.ident.to_lowercase()
    }
}

/// Conversion of a typed value into the generic model.
///
/// Object safe, so heterogeneous values can be encoded in one batch.
pub trait Encode {
    /// Encodes `self`. Record fields that fail are reported through `encoder`.
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError>;
}

/// A type with a static shape that can be rebuilt from a decoded generic tree.
pub trait Describe: Encode + Sized {
    /// The static structure of `Self`.
    fn shape() -> Shape;

    /// Builds `Self` from a decoded tree. `Value::Null` yields the zero value.
    fn assemble(value: Value) -> Result<Self, AssembleError>;
}

/// A type usable as a mapping key: round-trips through its text form.
pub trait MapKey: Sized {
    /// Text form used as the generic mapping key.
    fn to_key(&self) -> String;

    /// Parses a generic mapping key.
    fn from_key(key: &str) -> Option<Self>;
}

/// Field-by-field reader used by derived [`Describe::assemble`] impls.
#[derive(Debug)]
pub struct RecordReader {
    entries: BTreeMap<String, Value>,
}

impl RecordReader {
    /// Opens a decoded record. `Null` reads as a record with every field absent.
    pub fn new(value: Value) -> Result<Self, AssembleError> {
        match value {
            Value::Null => Ok(Self {
                entries: BTreeMap::new(),
            }),
            Value::Mapping(entries) => Ok(Self { entries }),
            other => Err(AssembleError::mismatch("mapping", &other)),
        }
    }

    /// Assembles the field stored under `ident`; absent fields get their zero value.
    pub fn take<T: Describe>(&mut self, ident: &str) -> Result<T, AssembleError> {
        let value = self.entries.remove(ident).unwrap_or(Value::Null);
        T::assemble(value).map_err(|e| e.in_field(ident))
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
        (**self).encode(encoder)
    }
}

impl Encode for bool {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Ok(Value::Bool(*self))
    }
}

impl Describe for bool {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Bool)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            other => Err(AssembleError::mismatch("bool", &other)),
        }
    }
}

macro_rules! describe_int {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
                    i64::try_from(*self)
                        .map(Value::Int)
                        .map_err(|_| EncodeError::OutOfRange {
                            type_name: stringify!($ty),
                            value: self.to_string(),
                        })
                }
            }

            impl Describe for $ty {
                fn shape() -> Shape {
                    Shape::Scalar(ScalarKind::$kind)
                }

                fn assemble(value: Value) -> Result<Self, AssembleError> {
                    match value {
                        Value::Null => Ok(0),
                        Value::Int(n) => <$ty>::try_from(n).map_err(|_| AssembleError::OutOfRange {
                            target: stringify!($ty),
                            value: n.to_string(),
                        }),
                        other => Err(AssembleError::mismatch("int", &other)),
                    }
                }
            }

            impl MapKey for $ty {
                fn to_key(&self) -> String {
                    self.to_string()
                }

                fn from_key(key: &str) -> Option<Self> {
                    key.trim().parse().ok()
                }
            }
        )*
    };
}

describe_int! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => U64,
}

impl Encode for f32 {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl Describe for f32 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::F32)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        f64::assemble(value).map(|f| f as f32)
    }
}

impl Encode for f64 {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Ok(Value::Float(*self))
    }
}

impl Describe for f64 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::F64)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        match value {
            Value::Null => Ok(0.0),
            Value::Float(f) => Ok(f),
            Value::Int(n) => Ok(n as f64),
            other => Err(AssembleError::mismatch("float", &other)),
        }
    }
}

impl Encode for str {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Ok(Value::String(self.to_string()))
    }
}

impl Encode for String {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Ok(Value::String(self.clone()))
    }
}

impl Describe for String {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::String)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            other => Err(AssembleError::mismatch("string", &other)),
        }
    }
}

// '\0' is the zero char and encodes as the empty string, so it reads as absent.
impl Encode for char {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        if *self == '\0' {
            Ok(Value::String(String::new()))
        } else {
            Ok(Value::String(self.to_string()))
        }
    }
}

impl Describe for char {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Char)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        match value {
            Value::Null => Ok('\0'),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => Ok('\0'),
                    (Some(c), None) => Ok(c),
                    _ => Err(AssembleError::OutOfRange {
                        target: "char",
                        value: s,
                    }),
                }
            }
            other => Err(AssembleError::mismatch("char", &other)),
        }
    }
}

impl MapKey for String {
    fn to_key(&self) -> String {
        self.clone()
    }

    fn from_key(key: &str) -> Option<Self> {
        Some(key.to_string())
    }
}

impl MapKey for bool {
    fn to_key(&self) -> String {
        self.to_string()
    }

    fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl Encode for Value {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Ok(self.clone())
    }
}

impl Describe for Value {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Any)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        Ok(value)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
        match self {
            Some(inner) => inner.encode(encoder),
            None => Ok(Value::Null),
        }
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(T::shape)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        match value {
            Value::Null => Ok(None),
            other => T::assemble(other).map(Some),
        }
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
        (**self).encode(encoder)
    }
}

impl<T: Describe> Describe for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        T::assemble(value).map(Box::new)
    }
}

fn encode_elements<'a, T, I>(items: I, encoder: &mut Encoder) -> Result<Value, EncodeError>
where
    T: Encode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let encoded: Result<Vec<Value>, EncodeError> =
        items.into_iter().map(|item| item.encode(encoder)).collect();
    Ok(Value::Sequence(encoded?))
}

fn assemble_elements<T: Describe>(value: Value) -> Result<Vec<T>, AssembleError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| T::assemble(item).map_err(|e| e.at_index(i)))
            .collect(),
        other => Err(AssembleError::mismatch("sequence", &other)),
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
        encode_elements(self, encoder)
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(T::shape)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        assemble_elements(value)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
        encode_elements(self, encoder)
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn shape() -> Shape {
        Shape::Sequence(T::shape)
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        let items: Vec<T> = match value {
            Value::Null => (0..N)
                .map(|_| T::assemble(Value::Null))
                .collect::<Result<_, _>>()?,
            other => assemble_elements(other)?,
        };
        let found = items.len();
        items
            .try_into()
            .map_err(|_| AssembleError::LengthMismatch { expected: N, found })
    }
}

fn encode_entries<'a, K, V, I>(entries: I, encoder: &mut Encoder) -> Result<Value, EncodeError>
where
    K: MapKey + 'a,
    V: Encode + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let mut map = BTreeMap::new();
    for (key, value) in entries {
        map.insert(key.to_key(), value.encode(encoder)?);
    }
    Ok(Value::Mapping(map))
}

fn assemble_entries<K, V>(value: Value) -> Result<Vec<(K, V)>, AssembleError>
where
    K: MapKey,
    V: Describe,
{
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(map) => map
            .into_iter()
            .map(|(raw, item)| {
                let key = K::from_key(&raw).ok_or_else(|| AssembleError::InvalidKey {
                    key: raw.clone(),
                    target: std::any::type_name::<K>(),
                })?;
                let item = V::assemble(item).map_err(|e| e.in_field(raw))?;
                Ok((key, item))
            })
            .collect(),
        other => Err(AssembleError::mismatch("mapping", &other)),
    }
}

impl<K: MapKey, V: Encode> Encode for HashMap<K, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
        encode_entries(self, encoder)
    }
}

impl<K, V> Describe for HashMap<K, V>
where
    K: Describe + MapKey + Eq + Hash,
    V: Describe,
{
    fn shape() -> Shape {
        Shape::Mapping {
            key: K::shape,
            value: V::shape,
        }
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        Ok(assemble_entries(value)?.into_iter().collect())
    }
}

impl<K: MapKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<Value, EncodeError> {
        encode_entries(self, encoder)
    }
}

impl<K, V> Describe for BTreeMap<K, V>
where
    K: Describe + MapKey + Ord,
    V: Describe,
{
    fn shape() -> Shape {
        Shape::Mapping {
            key: K::shape,
            value: V::shape,
        }
    }

    fn assemble(value: Value) -> Result<Self, AssembleError> {
        Ok(assemble_entries(value)?.into_iter().collect())
    }
}

impl<R> Encode for fn() -> R {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Err(EncodeError::Unsupported { kind: "func" })
    }
}

impl<R> Describe for fn() -> R {
    fn shape() -> Shape {
        Shape::Callable
    }

    fn assemble(_value: Value) -> Result<Self, AssembleError> {
        Err(AssembleError::Unsupported { kind: "func" })
    }
}

impl<A, R> Encode for fn(A) -> R {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Value, EncodeError> {
        Err(EncodeError::Unsupported { kind: "func" })
    }
}

impl<A, R> Describe for fn(A) -> R {
    fn shape() -> Shape {
        Shape::Callable
    }

    fn assemble(_value: Value) -> Result<Self, AssembleError> {
        Err(AssembleError::Unsupported { kind: "func" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    #[test]
    fn test_scalar_shapes() {
        assert!(matches!(bool::shape(), Shape::Scalar(ScalarKind::Bool)));
        assert!(matches!(u16::shape(), Shape::Scalar(ScalarKind::U16)));
        assert!(matches!(String::shape(), Shape::Scalar(ScalarKind::String)));
        assert!(matches!(Value::shape(), Shape::Scalar(ScalarKind::Any)));
        assert_eq!(<fn() -> i32>::shape().kind_name(), "func");
    }

    #[test]
    fn test_container_shapes_are_lazy() {
        match Vec::<Option<i32>>::shape() {
            Shape::Sequence(element) => match element() {
                Shape::Optional(inner) => {
                    assert!(matches!(inner(), Shape::Scalar(ScalarKind::I32)))
                }
                other => panic!("expected optional element, got {other:?}"),
            },
            other => panic!("expected sequence, got {other:?}"),
        }

        match HashMap::<String, f64>::shape() {
            Shape::Mapping { key, value } => {
                assert!(matches!(key(), Shape::Scalar(ScalarKind::String)));
                assert!(matches!(value(), Shape::Scalar(ScalarKind::F64)));
            }
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_int_assemble_checks_range() {
        assert_eq!(u8::assemble(Value::Int(255)), Ok(255));
        assert!(matches!(
            u8::assemble(Value::Int(256)),
            Err(AssembleError::OutOfRange { target: "u8", .. })
        ));
        assert_eq!(i32::assemble(Value::Null), Ok(0));
    }

    #[test]
    fn test_u64_above_i64_max_fails_to_encode() {
        assert!(matches!(
            encode(&u64::MAX),
            Err(EncodeError::OutOfRange { type_name: "u64", .. })
        ));
        assert_eq!(encode(&42u64).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_char_round_trip() {
        assert_eq!(encode(&'x').unwrap(), Value::from("x"));
        assert_eq!(encode(&'\0').unwrap(), Value::from(""));
        assert_eq!(char::assemble(Value::from("x")), Ok('x'));
        assert_eq!(char::assemble(Value::Null), Ok('\0'));
        assert!(char::assemble(Value::from("xy")).is_err());
    }

    #[test]
    fn test_option_null_is_none() {
        assert_eq!(Option::<i64>::assemble(Value::Null), Ok(None));
        assert_eq!(Option::<i64>::assemble(Value::Int(3)), Ok(Some(3)));
    }

    #[test]
    fn test_array_length_mismatch() {
        let two = Value::Sequence(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(<[i32; 2]>::assemble(two.clone()), Ok([1, 2]));
        assert_eq!(
            <[i32; 3]>::assemble(two),
            Err(AssembleError::LengthMismatch {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(<[i32; 2]>::assemble(Value::Null), Ok([0, 0]));
    }

    #[test]
    fn test_map_keys_parse_from_text() {
        let mut map = BTreeMap::new();
        map.insert("1".to_string(), Value::from("one"));
        map.insert("2".to_string(), Value::from("two"));
        let assembled = HashMap::<u32, String>::assemble(Value::Mapping(map)).unwrap();
        assert_eq!(assembled.get(&1).map(String::as_str), Some("one"));

        let mut bad = BTreeMap::new();
        bad.insert("x".to_string(), Value::from("one"));
        assert!(matches!(
            HashMap::<u32, String>::assemble(Value::Mapping(bad)),
            Err(AssembleError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_sequence_element_error_is_indexed() {
        let value = Value::Sequence(vec![Value::Int(1), Value::from("x")]);
        assert_eq!(
            Vec::<i64>::assemble(value),
            Err(AssembleError::TypeMismatch {
                expected: "int",
                found: "string"
            }
            .at_index(1))
        );
    }
}
