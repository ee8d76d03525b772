//! # Schema Errors
//!
//! Two families of failure:
//!
//! - [`CompileError`]: the compiler could not turn a type description into a
//!   schema tree. Raised once, at compile time.
//! - Decode failures: input did not satisfy a compiled schema. Every failing
//!   field becomes a [`FieldError`] leaf in an [`ErrorTree`] that mirrors the
//!   shape of the input, and the public decode entry points return the tree
//!   inside [`DecodeFailure`].
//!
//! The tree itself is uniform: a leaf, or a branch of segment-keyed
//! subtrees. [`ErrorTree::collapsed`] produces the compact presentation in
//! which a level holding a single failure is replaced by that failure.

use std::fmt;

use shapecast_core::{AssembleError, EncodeError, Value};
use thiserror::Error;

/// Errors raised while compiling a type description into a schema tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A position holds a shape that cannot be represented as data.
    #[error("cannot compile '{name}': {kind} values are not representable")]
    Unsupported {
        /// Declared name of the offending position (the type name at the root).
        name: String,
        /// Kind name of the unsupported shape.
        kind: &'static str,
    },

    /// Nesting went deeper than the configured limit, usually a self-referential type.
    #[error("cannot compile '{name}': nesting exceeds the depth limit of {limit}")]
    DepthExceeded {
        /// Declared name of the position where the limit was hit.
        name: String,
        /// Configured limit.
        limit: usize,
    },
}

/// Category of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required value is absent.
    Missing,
    /// Input of the wrong kind that could not be coerced.
    InvalidType,
    /// Input of the right kind that breaks a value rule (`non_zero`).
    InvalidValue,
}

impl ErrorKind {
    /// The fixed message carried by errors of this kind.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Missing => "missing",
            ErrorKind::InvalidType => "invalid type",
            ErrorKind::InvalidValue => "invalid value",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// External name of the failing node. Empty for sequence elements and
    /// mapping values.
    pub field: String,
    /// Dotted path from the root, with `[i]` for sequence indices.
    pub path: String,
    /// Whether the failing node is required.
    pub required: bool,
    pub kind: ErrorKind,
}

impl FieldError {
    /// Returns the fixed message for this error's kind.
    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    /// Generic form of this error: `message`, `required`, and `field` /
    /// `path` when non-empty.
    pub fn to_value(&self) -> Value {
        let mut map = std::collections::BTreeMap::new();
        map.insert("message".to_string(), Value::from(self.message()));
        map.insert("required".to_string(), Value::Bool(self.required));
        if !self.field.is_empty() {
            map.insert("field".to_string(), Value::from(self.field.as_str()));
        }
        if !self.path.is_empty() {
            map.insert("path".to_string(), Value::from(self.path.as_str()));
        }
        Value::Mapping(map)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "  (root): {}", self.kind)
        } else {
            write!(f, "  {}: {}", self.path, self.kind)
        }
    }
}

/// Step from a node to one of its failing parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A record field (by external name) or a mapping entry (by key).
    Field(String),
    /// A sequence element.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Decode failures of one node, shaped like the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorTree {
    /// The node itself failed.
    Leaf(FieldError),
    /// Parts of the node failed, in visit order. Never empty.
    Branch(Vec<(Segment, ErrorTree)>),
}

impl ErrorTree {
    /// All leaf errors, depth first in visit order.
    pub fn leaves(&self) -> Vec<&FieldError> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldError>) {
        match self {
            ErrorTree::Leaf(err) => out.push(err),
            ErrorTree::Branch(entries) => {
                for (_, tree) in entries {
                    tree.collect_leaves(out);
                }
            }
        }
    }

    /// Number of leaf errors.
    pub fn len(&self) -> usize {
        match self {
            ErrorTree::Leaf(_) => 1,
            ErrorTree::Branch(entries) => entries.iter().map(|(_, tree)| tree.len()).sum(),
        }
    }

    /// Always false: a tree holds at least one error.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the leaf error recorded at `path`.
    pub fn find(&self, path: &str) -> Option<&FieldError> {
        self.leaves().into_iter().find(|err| err.path == path)
    }

    /// Subtree under `segment`, if this is a branch holding one.
    pub fn child(&self, segment: &Segment) -> Option<&ErrorTree> {
        match self {
            ErrorTree::Leaf(_) => None,
            ErrorTree::Branch(entries) => entries
                .iter()
                .find(|(seg, _)| seg == segment)
                .map(|(_, tree)| tree),
        }
    }

    /// Compact generic form.
    ///
    /// A leaf becomes its error object. A branch holding exactly one entry is
    /// replaced by that entry's collapsed form; a branch holding several
    /// becomes a mapping keyed by segment (`name` or `[i]`).
    pub fn collapsed(&self) -> Value {
        match self {
            ErrorTree::Leaf(err) => err.to_value(),
            ErrorTree::Branch(entries) => match entries.as_slice() {
                [(_, only)] => only.collapsed(),
                _ => Value::Mapping(
                    entries
                        .iter()
                        .map(|(segment, tree)| (segment.to_string(), tree.collapsed()))
                        .collect(),
                ),
            },
        }
    }

    fn entry_count(&self) -> usize {
        match self {
            ErrorTree::Leaf(_) => 1,
            ErrorTree::Branch(entries) => entries.len(),
        }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.leaves().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

/// Error returned by the public decode entry points.
#[derive(Error, Debug)]
pub enum DecodeFailure {
    /// The input did not satisfy the schema.
    #[error("decoding '{root}' failed:\n{errors}")]
    Invalid {
        /// External name of the root node (the type name for records).
        root: String,
        /// Every failure found.
        errors: ErrorTree,
    },

    /// The decoded tree could not be rebuilt as the target type.
    #[error("assembling decoded value failed: {0}")]
    Assemble(#[from] AssembleError),

    /// A typed input could not be normalized to the generic model.
    #[error("normalizing input failed: {0}")]
    Normalize(#[from] EncodeError),

    /// Text input was not valid YAML or JSON.
    #[error("parsing input failed: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl DecodeFailure {
    /// The error tree, for [`DecodeFailure::Invalid`].
    pub fn errors(&self) -> Option<&ErrorTree> {
        match self {
            DecodeFailure::Invalid { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Compact generic form of the failure.
    ///
    /// Validation failures use [`ErrorTree::collapsed`]; when the root holds
    /// more than one failing entry and has a name, the result is wrapped one
    /// level deeper under that name. Other failures render as their message.
    pub fn collapsed(&self) -> Value {
        match self {
            DecodeFailure::Invalid { root, errors } => {
                let inner = errors.collapsed();
                if errors.entry_count() > 1 && !root.is_empty() {
                    let mut wrapped = std::collections::BTreeMap::new();
                    wrapped.insert(root.clone(), inner);
                    Value::Mapping(wrapped)
                } else {
                    inner
                }
            }
            other => Value::from(other.to_string()),
        }
    }
}
