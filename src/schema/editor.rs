//! Schema Tree Editor
//!
//! Pure operations over a [`PageSchema`]: locate a node by path, read a field,
//! and replace a field. Edits never touch the schema they are given; they
//! return a new schema that copies only the lists and maps along the edited
//! path and shares every other subtree with the original.

use super::{PageSchema, Path, SchemaNode, Selector};
use crate::error::SchemaError;
use indexmap::IndexMap;
use std::sync::Arc;

/// A resolved location inside a schema
#[derive(Debug, Clone)]
pub struct NodeRef<'a> {
    schema: &'a PageSchema,
    path: Path,
    node: &'a SchemaNode,
}

impl<'a> NodeRef<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn node(&self) -> &'a SchemaNode {
        self.node
    }

    pub fn schema(&self) -> &'a PageSchema {
        self.schema
    }
}

/// Resolve `path` against `schema`
///
/// Fails with `InvalidPath` when an index is out of range, a key is absent, or
/// a selector is applied to a node of the wrong kind.
pub fn locate<'a>(schema: &'a PageSchema, path: &Path) -> Result<NodeRef<'a>, SchemaError> {
    let mut node = schema.root();
    for (depth, selector) in path.selectors().iter().enumerate() {
        node = step(node, selector).map_err(|reason| SchemaError::InvalidPath {
            path: path.to_string(),
            reason: format!("at segment {}: {}", depth, reason),
        })?;
    }
    Ok(NodeRef {
        schema,
        path: path.clone(),
        node,
    })
}

/// Read `field` of the located map node
pub fn get_field<'a>(node: &NodeRef<'a>, field: &str) -> Result<&'a SchemaNode, SchemaError> {
    let map = node.node.as_map().ok_or_else(|| SchemaError::InvalidPath {
        path: node.path.to_string(),
        reason: format!("expected a map, found a {}", node.node.kind()),
    })?;
    map.get(field).ok_or_else(|| SchemaError::InvalidPath {
        path: node.path.to_string(),
        reason: format!("no field '{}'", field),
    })
}

/// Return a copy of the node's schema with `field` of the node set to `value`
///
/// The field is inserted if the map does not have it yet.
pub fn set_field(
    node: &NodeRef<'_>,
    field: &str,
    value: SchemaNode,
) -> Result<PageSchema, SchemaError> {
    let root = rebuild(node.schema.root(), node.path.selectors(), field, value).map_err(
        |reason| SchemaError::InvalidPath {
            path: node.path.to_string(),
            reason,
        },
    )?;
    Ok(PageSchema::new(root))
}

fn step<'a>(node: &'a SchemaNode, selector: &Selector) -> Result<&'a SchemaNode, String> {
    match (node, selector) {
        (SchemaNode::List(items), Selector::Index(i)) => items
            .get(*i)
            .ok_or_else(|| format!("index {} out of range (len {})", i, items.len())),
        (SchemaNode::Map(fields), Selector::Key(k)) => {
            fields.get(k).ok_or_else(|| format!("key '{}' absent", k))
        }
        (other, selector) => Err(format!("cannot select '{}' in a {}", selector, other.kind())),
    }
}

fn rebuild(
    node: &SchemaNode,
    selectors: &[Selector],
    field: &str,
    value: SchemaNode,
) -> Result<SchemaNode, String> {
    let Some((selector, rest)) = selectors.split_first() else {
        return match node {
            SchemaNode::Map(fields) => {
                let mut copy: IndexMap<String, SchemaNode> = (**fields).clone();
                copy.insert(field.to_string(), value);
                Ok(SchemaNode::Map(Arc::new(copy)))
            }
            other => Err(format!("expected a map, found a {}", other.kind())),
        };
    };

    let child = step(node, selector)?;
    let new_child = rebuild(child, rest, field, value)?;

    match (node, selector) {
        (SchemaNode::List(items), Selector::Index(i)) => {
            let mut copy = (**items).clone();
            copy[*i] = new_child;
            Ok(SchemaNode::List(Arc::new(copy)))
        }
        (SchemaNode::Map(fields), Selector::Key(k)) => {
            let mut copy = (**fields).clone();
            copy.insert(k.clone(), new_child);
            Ok(SchemaNode::Map(Arc::new(copy)))
        }
        // step() already rejected every other combination
        (other, selector) => Err(format!("cannot select '{}' in a {}", selector, other.kind())),
    }
}
