//! Typed facade over a compiled schema tree.

use std::fmt;
use std::marker::PhantomData;

use shapecast_core::{encode, Describe, Encode, Value};

use crate::compile::{compile, CompileOptions};
use crate::error::{CompileError, DecodeFailure};
use crate::node::SchemaNode;

/// A compiled schema for `T`.
///
/// Decoding produces a complete `T` or a [`DecodeFailure`], never both.
/// `Schema<T>` is `Send + Sync` whatever `T` is, and can be shared behind
/// an `Arc` by threads decoding concurrently.
pub struct Schema<T> {
    root: SchemaNode,
    _target: PhantomData<fn() -> T>,
}

impl<T: Describe> Schema<T> {
    /// Compiles with the default options (annotation namespace `cast`).
    pub fn compile(sample: &T) -> Result<Self, CompileError> {
        Self::compile_with(sample, &CompileOptions::default())
    }

    /// Compiles with explicit options.
    pub fn compile_with(sample: &T, options: &CompileOptions) -> Result<Self, CompileError> {
        Ok(Self {
            root: compile(sample, options)?,
            _target: PhantomData,
        })
    }

    /// Decodes a generic value into `T`.
    pub fn decode(&self, input: &Value) -> Result<T, DecodeFailure> {
        let decoded = self.root.decode(input)?;
        Ok(T::assemble(decoded)?)
    }

    /// Decodes a JSON value into `T`.
    pub fn decode_json(&self, input: &serde_json::Value) -> Result<T, DecodeFailure> {
        self.decode(&Value::from(input.clone()))
    }

    /// Parses YAML (or JSON, which YAML accepts) text and decodes it into `T`.
    pub fn decode_yaml(&self, text: &str) -> Result<T, DecodeFailure> {
        let input: Value = serde_yaml::from_str(text)?;
        self.decode(&input)
    }

    /// Normalizes a typed value with the encoder, then decodes it into `T`.
    pub fn decode_from<S: Encode + ?Sized>(&self, input: &S) -> Result<T, DecodeFailure> {
        let normalized = encode(input)?;
        self.decode(&normalized)
    }
}

impl<T> Schema<T> {
    /// The compiled tree.
    pub fn node(&self) -> &SchemaNode {
        &self.root
    }

    pub fn into_node(self) -> SchemaNode {
        self.root
    }
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            _target: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("target", &std::any::type_name::<T>())
            .field("root", &self.root)
            .finish()
    }
}

impl<T> fmt::Display for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}
