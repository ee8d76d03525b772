//! # Schema Nodes
//!
//! A compiled schema is a tree of [`SchemaNode`]s. Each node carries the
//! resolved options of one position (the root, a record field, a sequence
//! element, a mapping key or value) and, through [`NodeKind`], the nodes
//! below it. Only records have named children; sequences and mappings have
//! exactly the element / key / value nodes their kind needs.
//!
//! Nodes are immutable after compilation and hold no interior mutability,
//! so a compiled tree can be shared between threads and decoded against
//! concurrently.

use std::collections::BTreeMap;

use shapecast_core::{ScalarKind, Value};

use crate::coerce::coerce;
use crate::options::FieldOptions;

/// Structural kind of a node, with the nodes below it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Leaf value of one scalar kind.
    Scalar(ScalarKind),
    /// Record with named children in declaration order. Flattened records
    /// contribute their children directly.
    Aggregate {
        type_name: &'static str,
        children: Vec<SchemaNode>,
    },
    /// Homogeneous sequence.
    Sequence { element: Box<SchemaNode> },
    /// String-keyed mapping; keys decode through `key`.
    Mapping {
        key: Box<SchemaNode>,
        value: Box<SchemaNode>,
    },
}

impl NodeKind {
    /// Kind name used in rendering: a scalar kind name or `struct`, `slice`, `map`.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Scalar(kind) => kind.name(),
            NodeKind::Aggregate { .. } => "struct",
            NodeKind::Sequence { .. } => "slice",
            NodeKind::Mapping { .. } => "map",
        }
    }
}

/// One compiled position.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub(crate) external_name: String,
    pub(crate) declared_name: String,
    pub(crate) kind: NodeKind,
    pub(crate) options: FieldOptions,
    pub(crate) is_pointer: bool,
    pub(crate) default_value: Option<Value>,
    pub(crate) origin: Vec<String>,
}

impl SchemaNode {
    /// Key looked up in input first: the annotated name or the lower-cased identifier.
    pub fn external_name(&self) -> &str {
        &self.external_name
    }

    /// Field identifier as declared; the type name at the root.
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Resolved options of this position.
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    pub fn is_required(&self) -> bool {
        self.options.required
    }

    pub fn is_nullable(&self) -> bool {
        self.options.nullable
    }

    /// The declared type is optional (`Option<T>`): absence decodes to `Null`.
    pub fn is_pointer(&self) -> bool {
        self.is_pointer
    }

    /// Non-zero value taken from the compile-time sample, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Declared names of the flattened records this node was hoisted from,
    /// outermost first. Empty for ordinary fields.
    pub fn origin(&self) -> &[String] {
        &self.origin
    }

    /// Children of a record node, empty for every other kind.
    pub fn children(&self) -> &[SchemaNode] {
        match &self.kind {
            NodeKind::Aggregate { children, .. } => children,
            _ => &[],
        }
    }

    /// Child of a record node by external name.
    pub fn child(&self, external_name: &str) -> Option<&SchemaNode> {
        self.children()
            .iter()
            .find(|child| child.external_name == external_name)
    }

    /// Element node of a sequence.
    pub fn element(&self) -> Option<&SchemaNode> {
        match &self.kind {
            NodeKind::Sequence { element } => Some(element),
            _ => None,
        }
    }

    /// Key and value nodes of a mapping.
    pub fn entry(&self) -> Option<(&SchemaNode, &SchemaNode)> {
        match &self.kind {
            NodeKind::Mapping { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// Result of decoding absent input without a default.
    pub fn zero_value(&self) -> Value {
        if self.is_pointer {
            Value::Null
        } else {
            self.empty_value()
        }
    }

    /// Zero value of the kind, ignoring pointer-ness.
    pub(crate) fn empty_value(&self) -> Value {
        match &self.kind {
            NodeKind::Scalar(kind) => kind.zero(),
            NodeKind::Aggregate { children, .. } => {
                let mut record = BTreeMap::new();
                for child in children {
                    place(&mut record, &child.origin, &child.declared_name, child.zero_value());
                }
                Value::Mapping(record)
            }
            NodeKind::Sequence { .. } => Value::Sequence(Vec::new()),
            NodeKind::Mapping { .. } => Value::Mapping(BTreeMap::new()),
        }
    }

    /// True when `value` can be assigned to this node without decoding.
    pub(crate) fn accepts_verbatim(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (NodeKind::Scalar(ScalarKind::Any), _) => true,
            (_, Value::Null) => self.is_pointer || self.options.nullable,
            (NodeKind::Scalar(ScalarKind::Bool), Value::Bool(_)) => true,
            (NodeKind::Scalar(ScalarKind::String), Value::String(_)) => true,
            (NodeKind::Scalar(ScalarKind::Char), Value::String(s)) => s.chars().count() <= 1,
            (NodeKind::Scalar(kind), Value::Int(n)) => kind
                .int_range()
                .is_some_and(|(lo, hi)| (lo..=hi).contains(n)),
            (NodeKind::Scalar(kind), Value::Float(_)) => kind.is_float(),
            (NodeKind::Sequence { element }, Value::Sequence(items)) => {
                items.iter().all(|item| element.accepts_verbatim(item))
            }
            (NodeKind::Mapping { key, value: node }, Value::Mapping(entries)) => entries
                .iter()
                .all(|(k, item)| key.accepts_key(k) && node.accepts_verbatim(item)),
            (NodeKind::Aggregate { children, .. }, Value::Mapping(record)) => {
                children.iter().all(|child| {
                    match lookup(record, &child.origin, &child.declared_name) {
                        None | Some(Value::Null) => true,
                        Some(item) => child.accepts_verbatim(item),
                    }
                })
            }
            _ => false,
        }
    }

    /// True when the mapping key text `raw` is already the canonical text of
    /// a value of this key node's kind.
    fn accepts_key(&self, raw: &str) -> bool {
        let NodeKind::Scalar(kind) = self.kind else {
            return false;
        };
        coerce(&Value::from(raw), kind, false)
            .ok()
            .and_then(|key| key.to_text())
            .is_some_and(|text| text == raw)
    }
}

/// Reads `name` from `record`, nested under each `origin` segment in turn.
fn lookup<'a>(
    record: &'a BTreeMap<String, Value>,
    origin: &[String],
    name: &str,
) -> Option<&'a Value> {
    match origin.split_first() {
        None => record.get(name),
        Some((head, rest)) => match record.get(head) {
            Some(Value::Mapping(nested)) => lookup(nested, rest, name),
            _ => None,
        },
    }
}

/// Stores `value` under `name`, nested under each `origin` segment in turn.
pub(crate) fn place(
    record: &mut BTreeMap<String, Value>,
    origin: &[String],
    name: &str,
    value: Value,
) {
    match origin.split_first() {
        None => {
            record.insert(name.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = record
                .entry(head.clone())
                .or_insert_with(|| Value::Mapping(BTreeMap::new()));
            if !matches!(slot, Value::Mapping(_)) {
                *slot = Value::Mapping(BTreeMap::new());
            }
            if let Value::Mapping(inner) = slot {
                place(inner, rest, name, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(name: &str, kind: ScalarKind) -> SchemaNode {
        SchemaNode {
            external_name: name.to_lowercase(),
            declared_name: name.to_string(),
            kind: NodeKind::Scalar(kind),
            options: FieldOptions::default(),
            is_pointer: false,
            default_value: None,
            origin: Vec::new(),
        }
    }

    #[test]
    fn test_scalar_zero_values() {
        assert_eq!(scalar("a", ScalarKind::I32).zero_value(), Value::Int(0));
        assert_eq!(scalar("a", ScalarKind::String).zero_value(), Value::from(""));
        assert_eq!(scalar("a", ScalarKind::Bool).zero_value(), Value::Bool(false));

        let mut ptr = scalar("a", ScalarKind::I32);
        ptr.is_pointer = true;
        assert_eq!(ptr.zero_value(), Value::Null);
    }

    #[test]
    fn test_aggregate_zero_nests_flattened_children() {
        let mut source = scalar("source", ScalarKind::String);
        source.origin = vec!["meta".into()];
        let node = SchemaNode {
            external_name: "Event".into(),
            declared_name: "Event".into(),
            kind: NodeKind::Aggregate {
                type_name: "Event",
                children: vec![scalar("name", ScalarKind::String), source],
            },
            options: FieldOptions::default(),
            is_pointer: false,
            default_value: None,
            origin: Vec::new(),
        };
        let zero = node.zero_value();
        assert_eq!(zero.get("name"), Some(&Value::from("")));
        assert_eq!(
            zero.get("meta").and_then(|m| m.get("source")),
            Some(&Value::from(""))
        );
        assert_eq!(node.children().len(), 2);
        assert!(node.child("source").is_some());
    }

    #[test]
    fn test_accepts_verbatim() {
        let small = scalar("n", ScalarKind::U8);
        assert!(small.accepts_verbatim(&Value::Int(200)));
        assert!(!small.accepts_verbatim(&Value::Int(300)));
        assert!(!small.accepts_verbatim(&Value::from("1")));
        assert!(scalar("v", ScalarKind::Any).accepts_verbatim(&Value::Sequence(vec![])));
    }

    #[test]
    fn test_accepts_verbatim_checks_mapping_keys() {
        let map = SchemaNode {
            kind: NodeKind::Mapping {
                key: Box::new(scalar("", ScalarKind::U32)),
                value: Box::new(scalar("", ScalarKind::String)),
            },
            ..scalar("stock", ScalarKind::String)
        };
        let entry =
            |k: &str| Value::Mapping(BTreeMap::from([(k.to_string(), Value::from("apple"))]));
        assert!(map.accepts_verbatim(&entry("7")));
        assert!(!map.accepts_verbatim(&entry("one")));
        assert!(!map.accepts_verbatim(&entry("-1")));
        assert!(!map.accepts_verbatim(&entry("7.0")));
    }

    #[test]
    fn test_place_replaces_non_mapping_slot() {
        let mut record = BTreeMap::new();
        record.insert("meta".to_string(), Value::Int(1));
        place(&mut record, &["meta".to_string()], "source", Value::from("api"));
        assert_eq!(
            record.get("meta").and_then(|m| m.get("source")),
            Some(&Value::from("api"))
        );
    }
}
