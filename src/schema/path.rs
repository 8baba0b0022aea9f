//! Paths into the page schema tree

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Field a page node uses to reference its content item
pub const LINK_FIELD: &str = "data";

/// One step into the tree: a list index or a map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    Index(usize),
    Key(String),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(i) => write!(f, "{}", i),
            Selector::Key(k) => f.write_str(k),
        }
    }
}

impl From<usize> for Selector {
    fn from(i: usize) -> Self {
        Selector::Index(i)
    }
}

impl From<&str> for Selector {
    fn from(k: &str) -> Self {
        Selector::Key(k.to_string())
    }
}

/// Ordered selectors from the schema root
///
/// Serializes as a JSON array, e.g. `[2, "data"]`, and parses from the dotted
/// form `2.data`, where numeric segments are indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Selector>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(selectors: Vec<Selector>) -> Self {
        Path(selectors)
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, selector: impl Into<Selector>) {
        self.0.push(selector.into());
    }

    pub fn child(&self, selector: impl Into<Selector>) -> Path {
        let mut next = self.clone();
        next.push(selector);
        next
    }

    /// Resolve a content path to the page node whose [`LINK_FIELD`] holds the link
    ///
    /// `[2, "data"]` and `[2]` both address node `[2]`. A trailing key other
    /// than [`LINK_FIELD`] names some other field of the node and is rejected.
    pub fn link_target(&self) -> Result<Path, SchemaError> {
        match self.0.split_last() {
            Some((Selector::Key(field), parent)) if field == LINK_FIELD => {
                Ok(Path(parent.to_vec()))
            }
            Some((Selector::Key(field), _)) => Err(SchemaError::InvalidPath {
                path: self.to_string(),
                reason: format!("'{}' is not a link field", field),
            }),
            _ => Ok(self.clone()),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

impl FromStr for Path {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Path::root());
        }
        let mut selectors = Vec::new();
        for segment in trimmed.split('.') {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(SchemaError::InvalidPath {
                    path: s.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            match segment.parse::<usize>() {
                Ok(i) => selectors.push(Selector::Index(i)),
                Err(_) => selectors.push(Selector::Key(segment.to_string())),
            }
        }
        Ok(Path(selectors))
    }
}

impl<S: Into<Selector>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}
