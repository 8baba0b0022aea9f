//! Page schema
//!
//! The page schema is a JSON-shaped tree describing the site's pages. Nodes
//! that display content carry a `data` field holding either `""` (unlinked) or
//! the [`ContentId`](crate::content::ContentId) of the item they show.
//!
//! Lists and maps sit behind `Arc`s so edits can copy only the path from the
//! root to the edited node and share everything else (see [`editor`]). Maps
//! keep the key order of the file they were read from.

pub mod editor;
pub mod path;

pub use editor::{get_field, locate, set_field, NodeRef};
pub use path::{Path, Selector, LINK_FIELD};

use crate::error::SchemaError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A node of the schema tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    List(Arc<Vec<SchemaNode>>),
    Map(Arc<IndexMap<String, SchemaNode>>),
    Value(Value),
}

impl SchemaNode {
    pub fn string(s: impl Into<String>) -> Self {
        SchemaNode::Value(Value::String(s.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SchemaNode::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match self {
            SchemaNode::Map(map) => Some(map),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SchemaNode::List(_) => "list",
            SchemaNode::Map(_) => "map",
            SchemaNode::Value(_) => "value",
        }
    }
}

impl From<Value> for SchemaNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                SchemaNode::List(Arc::new(items.into_iter().map(SchemaNode::from).collect()))
            }
            Value::Object(fields) => SchemaNode::Map(Arc::new(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, SchemaNode::from(v)))
                    .collect(),
            )),
            scalar => SchemaNode::Value(scalar),
        }
    }
}

fn to_json(node: &SchemaNode) -> Value {
    match node {
        SchemaNode::List(items) => Value::Array(items.iter().map(to_json).collect()),
        SchemaNode::Map(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        SchemaNode::Value(value) => value.clone(),
    }
}

/// The page tree loaded for an admin session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSchema {
    root: SchemaNode,
}

impl Default for PageSchema {
    fn default() -> Self {
        Self {
            root: SchemaNode::List(Arc::new(Vec::new())),
        }
    }
}

impl PageSchema {
    pub fn new(root: SchemaNode) -> Self {
        Self { root }
    }

    pub fn from_value(value: Value) -> Self {
        Self {
            root: SchemaNode::from(value),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        serde_json::from_slice(bytes).map_err(|e| SchemaError::InvalidDocument(e.to_string()))
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// The schema as a JSON value
    ///
    /// Infallible: every node is a list, a string-keyed map or a JSON value.
    pub fn to_value(&self) -> Value {
        to_json(&self.root)
    }

    /// Read the value at `path`
    pub fn get(&self, path: &Path) -> Result<&SchemaNode, SchemaError> {
        locate(self, path).map(|node| node.node())
    }

    /// The content id linked at a content path, `None` when unlinked
    pub fn link_at(&self, path: &Path) -> Result<Option<String>, SchemaError> {
        let node = locate(self, &path.link_target()?)?;
        let value = get_field(&node, LINK_FIELD)?;
        Ok(value.as_str().filter(|s| !s.is_empty()).map(str::to_string))
    }
}
