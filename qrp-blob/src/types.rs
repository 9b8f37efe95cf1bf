use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for object content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Filename recorded when the caller supplies none
pub const DEFAULT_FILENAME: &str = "upload.jpg";

/// Content type recorded when the caller supplies none
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Unique identifier for a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub String);

impl ObjectId {
    /// Generate a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted record for one stored object.
///
/// The record is the catalog entry: queries, downloads, and deletes all
/// resolve against the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub id: ObjectId,
    pub filename: String,
    pub content_type: String,
    /// Exact byte length of the stored payload
    pub length: u64,
    /// Span size the chunks were written with; recorded per object so a
    /// config change cannot corrupt reads of older objects
    pub chunk_size: u64,
    pub upload_date: DateTime<Utc>,
    /// Caller-supplied tags (question id, role, ...)
    pub metadata: BTreeMap<String, String>,
}

impl StoredObject {
    /// Tag value for `key`, if the object carries it
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Request to store an object
#[derive(Debug, Clone, Default)]
pub struct ObjectPut {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ObjectPut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach one metadata tag
    pub fn with_tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Conjunction of equality predicates over object metadata
#[derive(Debug, Clone, Default)]
pub struct ObjectFilter {
    tags: BTreeMap<String, String>,
}

impl ObjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`
    pub fn with_tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// True when every predicate matches the object's metadata
    pub fn matches(&self, object: &StoredObject) -> bool {
        self.tags
            .iter()
            .all(|(key, value)| object.tag(key) == Some(value.as_str()))
    }
}
