//! # Schema Compiler
//!
//! Turns the static description of a type ([`Describe::shape`]) plus a
//! sample value into a [`SchemaNode`] tree.
//!
//! The sample supplies defaults: it is encoded once, and every field whose
//! encoded sample value is non-zero records that value as its default.
//! Annotations are read from the namespace named by
//! [`CompileOptions::tag`].
//!
//! Nested shapes are produced lazily, so a self-referential type compiles
//! until [`CompileOptions::max_depth`] is hit and then fails with
//! [`CompileError::DepthExceeded`] instead of recursing without bound.

use serde::Deserialize;
use shapecast_core::{AggregateShape, Describe, Encoder, Shape, Value};

use crate::error::CompileError;
use crate::node::{NodeKind, SchemaNode};
use crate::options::FieldOptions;

/// Annotation namespace read when none is configured.
pub const DEFAULT_TAG: &str = "cast";

/// Nesting limit applied when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Compiler configuration.
///
/// Deserializable so it can sit inside a host application's config file;
/// missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Annotation namespace holding field options.
    pub tag: String,
    /// Maximum nesting depth below the root.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompileOptions {
    /// Options reading annotations from `tag`.
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }
}

/// Compiles the schema of `T`, taking field defaults from `sample`.
pub fn compile<T: Describe>(sample: &T, options: &CompileOptions) -> Result<SchemaNode, CompileError> {
    let mut encoder = Encoder::new();
    let encoded = match encoder.encode(sample) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "sample could not be encoded; compiling without defaults");
            None
        }
    };
    for err in encoder.diagnostics() {
        tracing::warn!(error = %err, "sample field could not be encoded; its default is left absent");
    }

    let shape = T::shape();
    let root_name = match &shape {
        Shape::Aggregate(aggregate) => aggregate.name.to_string(),
        _ => String::new(),
    };

    let compiler = Compiler { options };
    let node = compiler.build(
        shape,
        Site {
            declared_name: root_name.clone(),
            external_name: root_name,
            options: FieldOptions::default(),
            sample: encoded.as_ref(),
            depth: 0,
        },
    )?;

    tracing::debug!(
        root = %node.external_name,
        tag = %options.tag,
        fields = node.children().len(),
        "compiled schema"
    );
    Ok(node)
}

/// Position being compiled.
struct Site<'a> {
    declared_name: String,
    external_name: String,
    options: FieldOptions,
    sample: Option<&'a Value>,
    depth: usize,
}

impl Site<'_> {
    /// An element, key or value position: unnamed, default options, no sample.
    fn anonymous(depth: usize) -> Self {
        Self {
            declared_name: String::new(),
            external_name: String::new(),
            options: FieldOptions::default(),
            sample: None,
            depth,
        }
    }
}

struct Compiler<'o> {
    options: &'o CompileOptions,
}

impl Compiler<'_> {
    fn build(&self, shape: Shape, site: Site<'_>) -> Result<SchemaNode, CompileError> {
        if site.depth > self.options.max_depth {
            return Err(CompileError::DepthExceeded {
                name: site.declared_name,
                limit: self.options.max_depth,
            });
        }

        let kind = match shape {
            Shape::Optional(inner) => {
                let mut node = self.build(inner(), site)?;
                node.is_pointer = true;
                return Ok(node);
            }
            Shape::Callable => {
                return Err(CompileError::Unsupported {
                    name: site.declared_name,
                    kind: "func",
                })
            }
            Shape::Scalar(kind) => NodeKind::Scalar(kind),
            Shape::Sequence(element) => NodeKind::Sequence {
                element: Box::new(self.build(element(), Site::anonymous(site.depth + 1))?),
            },
            Shape::Mapping { key, value } => NodeKind::Mapping {
                key: Box::new(self.build(key(), Site::anonymous(site.depth + 1))?),
                value: Box::new(self.build(value(), Site::anonymous(site.depth + 1))?),
            },
            Shape::Aggregate(aggregate) => self.aggregate(aggregate, site.sample, site.depth)?,
        };

        let default_value = site.sample.filter(|value| !value.is_zero()).cloned();

        Ok(SchemaNode {
            external_name: site.external_name,
            declared_name: site.declared_name,
            kind,
            options: site.options,
            is_pointer: false,
            default_value,
            origin: Vec::new(),
        })
    }

    fn aggregate(
        &self,
        aggregate: AggregateShape,
        sample: Option<&Value>,
        depth: usize,
    ) -> Result<NodeKind, CompileError> {
        let mut children: Vec<SchemaNode> = Vec::with_capacity(aggregate.fields.len());

        for field in &aggregate.fields {
            let raw = field.options(&self.options.tag).unwrap_or_default();
            let options = FieldOptions::parse(raw, field.ident);
            if options.omit {
                continue;
            }

            let key = field.key();
            let flatten = options.flatten;
            let site = Site {
                declared_name: field.ident.to_string(),
                external_name: options.name.clone().unwrap_or_else(|| key.clone()),
                options,
                sample: sample.and_then(|s| s.get(&key)),
                depth: depth + 1,
            };
            let child = self.build((field.shape)(), site)?;

            // An optional record keeps its own node so absence stays distinguishable.
            if flatten && !child.is_pointer {
                if let NodeKind::Aggregate { children: nested, .. } = child.kind {
                    for mut hoisted in nested {
                        hoisted.origin.insert(0, field.ident.to_string());
                        insert_child(&mut children, hoisted, aggregate.name);
                    }
                    continue;
                }
            }
            if flatten {
                tracing::warn!(
                    record = aggregate.name,
                    field = field.ident,
                    "ignoring flatten on a field that is not a plain record"
                );
            }

            insert_child(&mut children, child, aggregate.name);
        }

        Ok(NodeKind::Aggregate {
            type_name: aggregate.name,
            children,
        })
    }
}

/// Appends `child`, replacing an earlier sibling with the same external name.
fn insert_child(children: &mut Vec<SchemaNode>, child: SchemaNode, record: &str) {
    if let Some(pos) = children
        .iter()
        .position(|existing| existing.external_name == child.external_name)
    {
        let dropped = children.remove(pos);
        tracing::warn!(
            record,
            name = %child.external_name,
            dropped = %dropped.declared_name,
            kept = %child.declared_name,
            "external name collision; the later field wins"
        );
    }
    children.push(child);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapecast_core::ScalarKind;

    #[derive(Debug, Clone, PartialEq, shapecast_core::Describe)]
    struct User {
        #[tag(cast = "name=user_name,required")]
        name: String,
        #[tag(cast = "non_zero")]
        age: u32,
        nickname: Option<String>,
        #[tag(cast = "-")]
        secret: String,
        tags: Vec<String>,
    }

    fn user() -> User {
        User {
            name: String::new(),
            age: 18,
            nickname: None,
            secret: "hidden".into(),
            tags: vec![],
        }
    }

    #[test]
    fn test_root_named_after_type() {
        let node = compile(&user(), &CompileOptions::default()).unwrap();
        assert_eq!(node.external_name(), "User");
        assert_eq!(node.declared_name(), "User");
        assert_eq!(node.kind().name(), "struct");
    }

    #[test]
    fn test_children_follow_declaration_order_and_skip_omitted() {
        let node = compile(&user(), &CompileOptions::default()).unwrap();
        let names: Vec<_> = node.children().iter().map(|c| c.external_name()).collect();
        assert_eq!(names, vec!["user_name", "age", "nickname", "tags"]);
    }

    #[test]
    fn test_defaults_only_for_non_zero_sample_fields() {
        let node = compile(&user(), &CompileOptions::default()).unwrap();
        assert_eq!(
            node.child("age").and_then(|c| c.default_value()),
            Some(&Value::Int(18))
        );
        assert_eq!(node.child("user_name").and_then(|c| c.default_value()), None);
        assert_eq!(node.child("tags").and_then(|c| c.default_value()), None);
    }

    #[test]
    fn test_option_field_is_pointer() {
        let node = compile(&user(), &CompileOptions::default()).unwrap();
        let nickname = node.child("nickname").unwrap();
        assert!(nickname.is_pointer());
        assert_eq!(nickname.kind(), &NodeKind::Scalar(ScalarKind::String));
        assert_eq!(nickname.zero_value(), Value::Null);
    }

    #[test]
    fn test_sequence_element_is_anonymous() {
        let node = compile(&user(), &CompileOptions::default()).unwrap();
        let element = node.child("tags").and_then(SchemaNode::element).unwrap();
        assert_eq!(element.external_name(), "");
        assert!(element.default_value().is_none());
    }

    #[test]
    fn test_other_namespace_ignores_cast_annotations() {
        let node = compile(&user(), &CompileOptions::with_tag("api")).unwrap();
        let names: Vec<_> = node.children().iter().map(|c| c.external_name()).collect();
        assert_eq!(names, vec!["name", "age", "nickname", "secret", "tags"]);
        assert!(!node.children()[0].is_required());
    }

    #[test]
    fn test_compile_options_deserialize_with_defaults() {
        let options: CompileOptions = serde_json::from_str(r#"{"tag": "api"}"#).unwrap();
        assert_eq!(options.tag, "api");
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }
}
