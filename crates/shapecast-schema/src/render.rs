//! Human-readable rendering of a compiled schema.
//!
//! Informational only: the rendered form is not parsed back.

use std::collections::BTreeMap;
use std::fmt;

use shapecast_core::Value;

use crate::node::SchemaNode;

impl SchemaNode {
    /// Generic description of this node: `name`, `type`, `in` when set,
    /// and `schema` (children by external name) for records with fields.
    pub fn to_map(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from(self.external_name.as_str()));
        let type_name = self
            .options
            .type_label
            .clone()
            .unwrap_or_else(|| self.kind.name().to_string());
        map.insert("type".to_string(), Value::String(type_name));
        if let Some(location) = &self.options.location {
            map.insert("in".to_string(), Value::from(location.as_str()));
        }

        let children = self.children();
        if !children.is_empty() {
            let schema = children
                .iter()
                .map(|child| (child.external_name.clone(), child.to_map()))
                .collect();
            map.insert("schema".to_string(), Value::Mapping(schema));
        }
        Value::Mapping(map)
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::Value::from(self.to_map());
        let text = serde_json::to_string_pretty(&json).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
