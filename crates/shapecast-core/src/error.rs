//! # Error Types
//!
//! Errors raised by the generic encoder and by typed assembly. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! - Encode errors name the unsupported kind or the out-of-range value and,
//!   when raised inside a record, the field that produced them.
//! - Assemble errors carry the field/index path down to the offending value.

use thiserror::Error;

/// Error while encoding a typed value into a generic [`Value`](crate::Value).
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The value has a kind the generic model cannot represent (e.g. a function).
    #[error("unsupported type: {kind}")]
    Unsupported {
        /// Kind name of the rejected value.
        kind: &'static str,
    },

    /// An unsigned integer does not fit the signed 64-bit integer scalar.
    #[error("{type_name} value {value} does not fit a signed 64-bit integer")]
    OutOfRange {
        /// Rust type of the value.
        type_name: &'static str,
        /// Textual form of the value.
        value: String,
    },

    /// A record field failed to encode.
    #[error("field '{field}': {source}")]
    Field {
        /// Declared identifier of the field.
        field: String,
        /// Underlying failure.
        source: Box<EncodeError>,
    },

    /// Several values failed to encode in one batch.
    #[error("{}", join_errors(.0))]
    Combined(Vec<EncodeError>),

    /// JSON text rendering failed.
    #[error("json rendering failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error while assembling a concrete value from a decoded generic tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssembleError {
    /// The generic value has the wrong kind for the target type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected kind.
        expected: &'static str,
        /// Kind actually found.
        found: &'static str,
    },

    /// A number does not fit the target type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        /// Target Rust type.
        target: &'static str,
        /// Textual form of the value.
        value: String,
    },

    /// A fixed-size array received the wrong number of elements.
    #[error("expected {expected} elements, found {found}")]
    LengthMismatch {
        /// Array length.
        expected: usize,
        /// Number of decoded elements.
        found: usize,
    },

    /// A mapping key could not be parsed into the key type.
    #[error("invalid mapping key '{key}' for {target}")]
    InvalidKey {
        /// Raw key text.
        key: String,
        /// Target key type.
        target: &'static str,
    },

    /// The target type cannot be built from data.
    #[error("unsupported type: {kind}")]
    Unsupported {
        /// Kind name of the target.
        kind: &'static str,
    },

    /// Failure inside a record field.
    #[error("field '{field}': {source}")]
    Field {
        /// Declared identifier of the field.
        field: String,
        /// Underlying failure.
        source: Box<AssembleError>,
    },

    /// Failure inside a sequence element.
    #[error("[{index}]: {source}")]
    Index {
        /// Element position.
        index: usize,
        /// Underlying failure.
        source: Box<AssembleError>,
    },
}

impl AssembleError {
    /// Shorthand for a kind mismatch against `found`.
    pub fn mismatch(expected: &'static str, found: &crate::Value) -> Self {
        AssembleError::TypeMismatch {
            expected,
            found: found.kind_name(),
        }
    }

    /// Scopes this error under a record field.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        AssembleError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Scopes this error under a sequence position.
    pub fn at_index(self, index: usize) -> Self {
        AssembleError::Index {
            index,
            source: Box::new(self),
        }
    }
}

fn join_errors(errors: &[EncodeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
