//! # Decode Engine
//!
//! Walks a compiled [`SchemaNode`] tree against loosely-typed input and
//! produces a decoded [`Value`] tree plus every failure found, shaped like
//! the input.
//!
//! The decoded tree is keyed by declared field names, so a derived
//! [`Describe::assemble`](shapecast_core::Describe::assemble) can rebuild
//! the typed record from it. Flattened fields are nested back under the
//! record they were hoisted from.
//!
//! [`SchemaNode::decode_value`] returns both halves of the result, which is
//! how a non-strict sequence reports its good elements next to the bad
//! ones. [`SchemaNode::decode`] is the either/or form used by callers.

use std::collections::BTreeMap;

use shapecast_core::{ScalarKind, Value};

use crate::coerce::coerce;
use crate::error::{DecodeFailure, ErrorKind, ErrorTree, FieldError, Segment};
use crate::node::{place, NodeKind, SchemaNode};

/// Decoded value of one node together with its failures.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Decoded value. When `errors` is set this is a partial result: failing
    /// positions hold their zero value or are left out.
    pub value: Value,
    pub errors: Option<ErrorTree>,
}

impl Outcome {
    fn ok(value: Value) -> Self {
        Self { value, errors: None }
    }

    fn failed(value: Value, errors: ErrorTree) -> Self {
        Self {
            value,
            errors: Some(errors),
        }
    }

    /// True when no failure was recorded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_none()
    }
}

fn field_path(parent: &str, name: &str) -> String {
    match (parent.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}.{name}"),
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

impl SchemaNode {
    /// Decodes `input`, returning the value or the complete error tree.
    pub fn decode(&self, input: &Value) -> Result<Value, DecodeFailure> {
        let outcome = self.decode_value(input);
        match outcome.errors {
            None => Ok(outcome.value),
            Some(errors) => Err(DecodeFailure::Invalid {
                root: self.external_name.clone(),
                errors,
            }),
        }
    }

    /// Decodes `input`, keeping partial results alongside any failures.
    pub fn decode_value(&self, input: &Value) -> Outcome {
        self.decode_at(input, "")
    }

    fn decode_at(&self, input: &Value, path: &str) -> Outcome {
        let blank = matches!(input, Value::String(s) if s.is_empty());
        if input.is_null() || (blank && !self.keeps_empty_string()) {
            return self.decode_absent(path);
        }
        self.decode_present(input, path)
    }

    fn keeps_empty_string(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar(ScalarKind::String))
    }

    fn decode_absent(&self, path: &str) -> Outcome {
        if let Some(default) = &self.default_value {
            return self.decode_present(default, path);
        }
        if self.options.required {
            return Outcome::failed(self.zero_value(), self.missing(path));
        }
        Outcome::ok(self.zero_value())
    }

    /// Missing error for this node: one per required child of a record,
    /// or a single error for the node itself.
    fn missing(&self, path: &str) -> ErrorTree {
        let per_child: Vec<(Segment, ErrorTree)> = self
            .children()
            .iter()
            .filter(|child| child.options.required)
            .map(|child| {
                let child_path = field_path(path, &child.external_name);
                (
                    Segment::Field(child.external_name.clone()),
                    ErrorTree::Leaf(child.error(&child_path, ErrorKind::Missing)),
                )
            })
            .collect();

        if per_child.is_empty() {
            ErrorTree::Leaf(self.error(path, ErrorKind::Missing))
        } else {
            ErrorTree::Branch(per_child)
        }
    }

    fn error(&self, path: &str, kind: ErrorKind) -> FieldError {
        FieldError {
            field: self.external_name.clone(),
            path: path.to_string(),
            required: self.options.required,
            kind,
        }
    }

    /// Input of the wrong kind: invalid type, or zero under `skip_on_error`.
    fn mismatch(&self, input: &Value, path: &str) -> Outcome {
        if self.options.skip_on_error {
            tracing::debug!(path, found = input.kind_name(), "skipping input of the wrong kind");
            return Outcome::ok(self.zero_value());
        }
        tracing::debug!(path, found = input.kind_name(), expected = self.kind.name(), "invalid type");
        Outcome::failed(
            self.zero_value(),
            ErrorTree::Leaf(self.error(path, ErrorKind::InvalidType)),
        )
    }

    fn decode_present(&self, input: &Value, path: &str) -> Outcome {
        let input = if self.options.non_zero && input.is_numeric_zero() {
            match &self.default_value {
                Some(default) => default,
                None => {
                    tracing::debug!(path, "zero rejected by non_zero");
                    return Outcome::failed(
                        self.zero_value(),
                        ErrorTree::Leaf(self.error(path, ErrorKind::InvalidValue)),
                    );
                }
            }
        } else {
            input
        };

        match &self.kind {
            NodeKind::Scalar(kind) => match coerce(input, *kind, self.options.escape) {
                Ok(value) => Outcome::ok(value),
                Err(mismatch) if self.options.skip_on_error => {
                    tracing::debug!(path, target = mismatch.target, found = mismatch.found, "skipping uncoercible value");
                    Outcome::ok(self.zero_value())
                }
                Err(mismatch) => {
                    tracing::debug!(path, target = mismatch.target, found = mismatch.found, "invalid type");
                    Outcome::failed(
                        self.zero_value(),
                        ErrorTree::Leaf(self.error(path, ErrorKind::InvalidType)),
                    )
                }
            },
            NodeKind::Sequence { element } => self.decode_sequence(element, input, path),
            NodeKind::Mapping { key, value } => self.decode_mapping(key, value, input, path),
            NodeKind::Aggregate { children, .. } => self.decode_aggregate(children, input, path),
        }
    }

    fn decode_sequence(&self, element: &SchemaNode, input: &Value, path: &str) -> Outcome {
        let Value::Sequence(items) = input else {
            return self.mismatch(input, path);
        };

        let mut decoded = Vec::with_capacity(items.len());
        let mut errors = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let item_path = index_path(path, i);
            let outcome = if self.options.recursive {
                element.decode_at(item, &item_path)
            } else if element.accepts_verbatim(item) {
                Outcome::ok(item.clone())
            } else {
                Outcome::failed(
                    Value::Null,
                    ErrorTree::Leaf(element.error(&item_path, ErrorKind::InvalidType)),
                )
            };

            match outcome.errors {
                None => decoded.push(outcome.value),
                Some(tree) => {
                    errors.push((Segment::Index(i), tree));
                    if self.options.strict {
                        break;
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Outcome::failed(Value::Sequence(decoded), ErrorTree::Branch(errors));
        }
        if decoded.is_empty() && self.options.required {
            return Outcome::failed(
                Value::Sequence(decoded),
                ErrorTree::Leaf(self.error(path, ErrorKind::Missing)),
            );
        }
        Outcome::ok(Value::Sequence(decoded))
    }

    fn decode_mapping(
        &self,
        key_node: &SchemaNode,
        value_node: &SchemaNode,
        input: &Value,
        path: &str,
    ) -> Outcome {
        let Value::Mapping(entries) = input else {
            return self.mismatch(input, path);
        };

        let mut decoded = BTreeMap::new();
        for (raw_key, item) in entries {
            let entry_path = field_path(path, raw_key);

            let key = key_node.decode_at(&Value::String(raw_key.clone()), &entry_path);
            let value = match key.errors {
                None => value_node.decode_at(item, &entry_path),
                Some(tree) => Outcome::failed(Value::Null, tree),
            };
            if let Some(tree) = value.errors {
                return Outcome::failed(
                    self.zero_value(),
                    ErrorTree::Branch(vec![(Segment::Field(raw_key.clone()), tree)]),
                );
            }

            let text = key.value.to_text().unwrap_or_else(|| raw_key.clone());
            decoded.insert(text, value.value);
        }
        Outcome::ok(Value::Mapping(decoded))
    }

    fn decode_aggregate(&self, children: &[SchemaNode], input: &Value, path: &str) -> Outcome {
        let Value::Mapping(data) = input else {
            return self.mismatch(input, path);
        };

        let mut record = match self.empty_value() {
            Value::Mapping(record) => record,
            _ => BTreeMap::new(),
        };
        let mut errors = Vec::new();

        for child in children {
            // A heritage child reads the parent's own keys, so its errors sit
            // at the parent's path.
            let child_path = if child.options.heritage {
                path.to_string()
            } else {
                field_path(path, &child.external_name)
            };

            let value = if child.options.heritage {
                input
            } else {
                let found = data
                    .get(&child.external_name)
                    .or_else(|| data.get(&child.declared_name));
                match found {
                    Some(Value::Null) if child.options.nullable => {
                        tracing::trace!(path = %child_path, "explicit null accepted");
                        continue;
                    }
                    Some(value) if !value.is_null() => value,
                    _ => match &child.default_value {
                        Some(default) => default,
                        None => {
                            if child.options.required {
                                errors.push((
                                    Segment::Field(child.external_name.clone()),
                                    ErrorTree::Leaf(child.error(&child_path, ErrorKind::Missing)),
                                ));
                            } else {
                                tracing::trace!(path = %child_path, "absent; left at zero");
                            }
                            continue;
                        }
                    },
                }
            };

            // Non-recursive sequences are checked element by element.
            let per_element = matches!(child.kind, NodeKind::Sequence { .. });
            let outcome = if child.options.recursive || per_element {
                child.decode_at(value, &child_path)
            } else if child.accepts_verbatim(value) {
                Outcome::ok(value.clone())
            } else {
                child.mismatch(value, &child_path)
            };

            match outcome.errors {
                Some(ErrorTree::Branch(entries)) if child.options.heritage => errors.extend(entries),
                Some(tree) => errors.push((Segment::Field(child.external_name.clone()), tree)),
                None => {}
            }
            place(&mut record, &child.origin, &child.declared_name, outcome.value);
        }

        let value = Value::Mapping(record);
        if errors.is_empty() {
            Outcome::ok(value)
        } else {
            Outcome::failed(value, ErrorTree::Branch(errors))
        }
    }
}
