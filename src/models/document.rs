//! Documents submitted for indexing.

use super::MetaFieldSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the one field every indexable document must carry.
pub const CONTENT_FIELD: &str = "content";

/// A batch of documents keyed by their unique document key.
///
/// Iteration follows key order, which fixes the order of derived records.
pub type DocumentBatch = BTreeMap<String, Document>;

/// A document: a required `content` string plus arbitrary metadata fields.
///
/// Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Creates an empty document (not indexable until `content` is set).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document holding only `content`.
    #[must_use]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self::new().with_field(CONTENT_FIELD, content.into())
    }

    /// Sets a field, replacing any previous value.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the text to embed, if the document has a string `content` field.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.fields.get(CONTENT_FIELD).and_then(Value::as_str)
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns all fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Copies the fields named in `meta_fields` that this document carries.
    #[must_use]
    pub fn project(&self, meta_fields: &MetaFieldSet) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(key, _)| meta_fields.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_requires_string() {
        assert_eq!(Document::with_content("cat").content(), Some("cat"));
        assert_eq!(Document::new().content(), None);
        assert_eq!(Document::new().with_field("content", 42).content(), None);
    }

    #[test]
    fn test_project_keeps_only_declared_fields() {
        let meta = MetaFieldSet::new(["doc_id", "title"]).unwrap();
        let doc = Document::with_content("body")
            .with_field("doc_id", "doc-1")
            .with_field("tokens", 120);

        let projected = doc.project(&meta);

        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get("doc_id"), Some(&json!("doc-1")));
        assert!(!projected.contains_key("tokens"));
        assert!(!projected.contains_key("content"));
    }

    #[test]
    fn test_serializes_flat() {
        let doc = Document::with_content("body").with_field("source", "wiki");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({"content": "body", "source": "wiki"}));

        let parsed: Document = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, doc);
    }
}
