//! Per-namespace vector storage configuration.

use crate::embedding::DEFAULT_MAX_BATCH_SIZE;
use crate::models::MetaFieldSet;
use crate::Result;

/// Default number of hits returned by `query_default`.
pub const DEFAULT_TOP_K: usize = 5;

/// Configuration for one vector storage namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStorageConfig {
    /// Collection name in the backing index.
    pub namespace: String,
    /// Document fields persisted and returned as metadata.
    pub meta_fields: Vec<String>,
    /// Maximum texts per embedding call.
    pub max_batch_size: usize,
    /// Hit count used by `query_default`.
    pub default_top_k: usize,
}

impl VectorStorageConfig {
    /// Creates a configuration with defaults for the given namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            meta_fields: Vec::new(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            default_top_k: DEFAULT_TOP_K,
        }
    }

    /// Sets the declared metadata fields.
    #[must_use]
    pub fn with_meta_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the maximum batch size.
    #[must_use]
    pub const fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Sets the default top-k.
    #[must_use]
    pub const fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    /// Validates and builds the metadata field set.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is empty or a field name is reserved.
    pub fn meta_field_set(&self) -> Result<MetaFieldSet> {
        if self.namespace.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "vector storage namespace must not be empty".to_string(),
            ));
        }
        MetaFieldSet::new(self.meta_fields.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VectorStorageConfig::new("chunks");
        assert_eq!(config.namespace, "chunks");
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.default_top_k, 5);
        assert!(config.meta_fields.is_empty());
    }

    #[test]
    fn test_meta_field_set_validation() {
        let ok = VectorStorageConfig::new("entities").with_meta_fields(["entity_name"]);
        assert!(ok.meta_field_set().unwrap().contains("entity_name"));

        let reserved = VectorStorageConfig::new("entities").with_meta_fields(["distance"]);
        assert!(reserved.meta_field_set().is_err());

        let unnamed = VectorStorageConfig::new("  ");
        assert!(unnamed.meta_field_set().is_err());
    }
}
