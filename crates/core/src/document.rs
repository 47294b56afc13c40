use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata key holding the stable identifier of a (parent) document.
pub const ENTRY_ID: &str = "entry_id";
pub const PUBLISHED: &str = "Published";
pub const TITLE: &str = "Title";
pub const AUTHORS: &str = "Authors";
pub const SUMMARY: &str = "Summary";
pub const FILE_NAME: &str = "file_name";
pub const PAGE_LABEL: &str = "page_label";

/// Separator between a parent entry id and the chunk index.
pub const CHUNK_MARKER: &str = "_chunk_";

/// Ordered metadata mapping. Insertion order is kept so that inspection
/// output lists keys the way loaders wrote them.
pub type Metadata = IndexMap<String, MetadataValue>;

/// Typed metadata values. Loaders mostly produce text, but numbers and
/// author lists survive a round trip through storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<String>),
}

impl MetadataValue {
    /// Extract as string, returning None for non-text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Text(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(x) => write!(f, "{x}"),
            MetadataValue::Boolean(b) => write!(f, "{b}"),
            MetadataValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(items: Vec<String>) -> Self {
        MetadataValue::List(items)
    }
}

/// A unit of source text plus its metadata. Both parent documents and the
/// chunks derived from them use this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub text: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_metadata(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Text metadata lookup.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }

    /// The document's `entry_id`, if present and non-empty.
    pub fn entry_id(&self) -> Option<&str> {
        self.get_str(ENTRY_ID).filter(|id| !id.is_empty())
    }
}

/// Build the identifier of chunk `index` of the parent `base`.
pub fn chunk_entry_id(base: &str, index: usize) -> String {
    format!("{base}{CHUNK_MARKER}{index}")
}

/// Strip every trailing `_chunk_{n}` suffix, recovering the original parent id.
///
/// Only numeric suffixes are stripped, so an id that merely contains the
/// marker text (e.g. `my_chunk_notes`) is left alone.
pub fn parent_entry_id(id: &str) -> &str {
    let mut base = id;
    while let Some((head, index)) = base.rsplit_once(CHUNK_MARKER) {
        if head.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        base = head;
    }
    base
}
