//! Content items
//!
//! A content item is a persisted record of `metadata` and field `data`,
//! addressed by a [`ContentId`]. Page nodes reference content items by id;
//! the store owns them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static CONTENT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque content identifier, stable for the life of the item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Parse an id received from outside; ids are single path-safe segments
    pub fn parse(raw: &str) -> Result<Self, String> {
        if is_safe_segment(raw) {
            Ok(ContentId(raw.to_string()))
        } else {
            Err(format!("invalid content id '{}'", raw))
        }
    }

    /// Allocate a new id: `c-<millis>-<pid>-<seq>`
    pub fn generate() -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let pid = std::process::id();
        let seq = CONTENT_COUNTER.fetch_add(1, Ordering::Relaxed);
        ContentId(format!("c-{ts:x}-{pid:x}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Template identifier supplied when content is created or loaded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn parse(raw: &str) -> Result<Self, String> {
        if is_safe_segment(raw) {
            Ok(TemplateId(raw.to_string()))
        } else {
            Err(format!("invalid template id '{}'", raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted content document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ContentData {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.data.is_empty()
    }
}

/// A loaded content item as handed to the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub template_id: TemplateId,
    pub metadata: Map<String, Value>,
    pub data: Map<String, Value>,
}

impl ContentItem {
    pub fn new(id: ContentId, template_id: TemplateId, document: ContentData) -> Self {
        Self {
            id,
            template_id,
            metadata: document.metadata,
            data: document.data,
        }
    }

    pub fn document(&self) -> ContentData {
        ContentData {
            metadata: self.metadata.clone(),
            data: self.data.clone(),
        }
    }
}

/// Decode a stored content document
///
/// Accepts `metadata` (or the older `_metadata`) and `data` either as JSON
/// objects or as strings holding a serialized object.
pub fn decode_document(bytes: &[u8]) -> Result<ContentData, String> {
    let raw: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    let Value::Object(mut fields) = raw else {
        return Err("content document is not an object".to_string());
    };

    let metadata = fields
        .remove("metadata")
        .or_else(|| fields.remove("_metadata"));
    let data = fields.remove("data");

    Ok(ContentData {
        metadata: object_field("metadata", metadata)?,
        data: object_field("data", data)?,
    })
}

/// Encode a content document for storage
pub fn encode_document(document: &ContentData) -> Result<Vec<u8>, String> {
    serde_json::to_vec_pretty(document).map_err(|e| e.to_string())
}

fn object_field(key: &str, value: Option<Value>) -> Result<Map<String, Value>, String> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(Value::Array(items)) if items.is_empty() => Ok(Map::new()),
            Ok(_) => Err(format!("'{}' does not hold an object", key)),
            Err(e) => Err(format!("'{}' holds invalid JSON: {}", key, e)),
        },
        Some(_) => Err(format!("'{}' is not an object", key)),
    }
}

fn is_safe_segment(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= 128
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
