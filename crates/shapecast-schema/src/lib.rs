//! # shapecast-schema: Annotation-Driven Decoding
//!
//! Compiles the static description of a record type into a schema tree and
//! decodes loosely-typed input (JSON, YAML, or any [`Value`]) against it.
//!
//! ## Compilation (`compile`)
//!
//! [`compile`] reads each field's annotation string from one namespace
//! (`cast` by default, see [`CompileOptions`]) and a sample value that
//! supplies defaults. Annotations are comma-separated options:
//!
//! ```text
//! #[tag(cast = "name=user_name,required,escape")]
//! ```
//!
//! See [`FieldOptions`] for the full list. Malformed annotations never fail
//! compilation; they are logged and ignored.
//!
//! ## Decoding (`decode`)
//!
//! [`SchemaNode::decode`] coerces scalars to their target kinds, fills
//! defaults, and collects every failure into an [`ErrorTree`] instead of
//! stopping at the first one. [`Schema`] wraps a tree with its target type
//! and rebuilds a typed value from the decoded tree.
//!
//! ```ignore
//! let schema = Schema::compile(&User::default())?;
//! let user = schema.decode_json(&serde_json::json!({"user_name": "ana"}))?;
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `shapecast-core` internally.
//! - Compiled trees are immutable and `Send + Sync`.
//! - Decoding never panics on input; every rejection is an [`ErrorTree`] leaf.

mod coerce;
pub mod compile;
pub mod decode;
pub mod error;
pub mod node;
pub mod options;
mod render;
pub mod schema;

pub use compile::{compile, CompileOptions, DEFAULT_MAX_DEPTH, DEFAULT_TAG};
pub use decode::Outcome;
pub use error::{CompileError, DecodeFailure, ErrorKind, ErrorTree, FieldError, Segment};
pub use node::{NodeKind, SchemaNode};
pub use options::FieldOptions;
pub use schema::Schema;

pub use shapecast_core::{Describe, Value};
