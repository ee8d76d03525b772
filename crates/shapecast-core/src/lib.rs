//! # shapecast-core: Foundational Types
//!
//! The leaf crate of the shapecast workspace. It defines the data model that
//! every other crate speaks:
//!
//! 1. **[`Value`]**, an explicit tagged union over null, bool, int, float,
//!    string, sequence and mapping. Decoder input and encoder output are
//!    always a `Value`; JSON interop goes through `serde_json::Value`.
//!
//! 2. **[`Describe`] / [`Shape`]**, the static description a type gives of
//!    itself: scalar kind, annotated record fields, sequence, mapping, or
//!    optional wrapper. `#[derive(Describe)]` (feature `derive`, on by
//!    default) generates it for structs with named fields.
//!
//! 3. **The generic encoder** ([`encode`], [`encode_all`],
//!    [`encode_to_json`]), a best-effort structural walk from typed values
//!    to `Value`.
//!
//! 4. **[`html_escape`]**, used by string fields decoded with `escape`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `shapecast-*` crates except the derive macro.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

// Lets `#[derive(Describe)]` output (which names `::shapecast_core`) compile
// inside this crate's own tests.
extern crate self as shapecast_core;

pub mod describe;
pub mod encode;
pub mod error;
pub mod escape;
pub mod value;

pub use describe::{
    AggregateShape, Describe, Encode, FieldShape, MapKey, RecordReader, ScalarKind, Shape,
};
pub use encode::{encode, encode_all, encode_to_json, Encoder};
pub use error::{AssembleError, EncodeError};
pub use escape::html_escape;
pub use value::Value;

#[cfg(feature = "derive")]
pub use shapecast_derive::Describe;
