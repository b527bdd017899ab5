//! Vector index client contract.
//!
//! A [`VectorIndexClient`] is a handle to a concrete vector database. It
//! knows nothing about documents or embedders; it stores and searches
//! `(id, vector, metadata)` records in named collections.

use crate::models::UpsertConfirmation;
use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Maximum id length declared for new collections.
pub const DEFAULT_ID_MAX_LENGTH: usize = 64;

/// Primary key type of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Variable-length string bounded by `max_length` bytes.
    FixedLengthString {
        /// Longest accepted id in bytes.
        max_length: usize,
    },
}

impl Default for IdKind {
    fn default() -> Self {
        Self::FixedLengthString {
            max_length: DEFAULT_ID_MAX_LENGTH,
        }
    }
}

/// Similarity metric for searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Cosine similarity; larger scores are better matches.
    #[default]
    Cosine,
}

impl Metric {
    /// Returns the metric name as backends spell it.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "COSINE",
        }
    }
}

/// Parameters for creating a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    /// Collection name.
    pub name: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Primary key type.
    pub id_kind: IdKind,
}

impl CollectionSpec {
    /// Creates a spec with string ids of [`DEFAULT_ID_MAX_LENGTH`].
    #[must_use]
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            id_kind: IdKind::default(),
        }
    }
}

/// A record written to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    /// Document key.
    pub id: String,
    /// Embedding.
    pub vector: Vec<f32>,
    /// Metadata projection.
    pub metadata: Map<String, Value>,
}

/// A similarity search request.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Collection to search.
    pub collection: &'a str,
    /// Query vector.
    pub vector: &'a [f32],
    /// Maximum number of hits.
    pub limit: usize,
    /// Metadata fields to return with each hit.
    pub output_fields: &'a [String],
    /// Ranking metric.
    pub metric: Metric,
}

/// A ranked hit returned by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Record id.
    pub id: String,
    /// Score under the request metric.
    pub distance: f32,
    /// Requested metadata fields.
    pub entity: Map<String, Value>,
}

/// Trait for vector database clients.
///
/// # Implementor Notes
///
/// - `upsert` must be insert-or-replace by id (last write wins)
/// - `search` returns hits best-first and at most `limit` of them
/// - Errors are returned as-is; callers decide on retries
#[async_trait]
pub trait VectorIndexClient: Send + Sync {
    /// Returns true if the collection exists.
    async fn has_collection(&self, name: &str) -> Result<bool>;

    /// Creates a collection.
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()>;

    /// Inserts or replaces records in bulk.
    async fn upsert(&self, collection: &str, records: Vec<IndexRecord>)
    -> Result<UpsertConfirmation>;

    /// Runs a similarity search.
    async fn search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchHit>>;

    /// Releases the connection. Called once when the owning storage closes.
    async fn release(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<C: VectorIndexClient + ?Sized> VectorIndexClient for Arc<C> {
    async fn has_collection(&self, name: &str) -> Result<bool> {
        (**self).has_collection(name).await
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        (**self).create_collection(spec).await
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<IndexRecord>,
    ) -> Result<UpsertConfirmation> {
        (**self).upsert(collection, records).await
    }

    async fn search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchHit>> {
        (**self).search(request).await
    }

    async fn release(&self) -> Result<()> {
        (**self).release().await
    }
}

/// Creates the collection if it does not exist.
///
/// Returns true if a collection was created. An existing collection is left
/// untouched; its dimension is not compared with `dimension`.
///
/// # Errors
///
/// Returns an error if the existence check or the create call fails.
pub async fn ensure_collection<C>(client: &C, name: &str, dimension: usize) -> Result<bool>
where
    C: VectorIndexClient + ?Sized,
{
    if client.has_collection(name).await? {
        tracing::debug!(collection = name, "Collection already exists");
        return Ok(false);
    }

    client
        .create_collection(&CollectionSpec::new(name, dimension))
        .await
        .inspect_err(|e| {
            tracing::error!(collection = name, error = %e, "Failed to create collection");
        })?;

    tracing::info!(collection = name, dimension, "Collection created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::vector::InMemoryIndexClient;

    #[tokio::test]
    async fn test_ensure_collection_idempotent() {
        let client = InMemoryIndexClient::new();

        assert!(ensure_collection(&client, "chunks", 8).await.unwrap());
        assert!(!ensure_collection(&client, "chunks", 8).await.unwrap());
        assert!(client.has_collection("chunks").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_collection_ignores_existing_dimension() {
        let client = InMemoryIndexClient::new();
        ensure_collection(&client, "chunks", 8).await.unwrap();

        assert!(!ensure_collection(&client, "chunks", 16).await.unwrap());
        assert_eq!(client.dimension("chunks"), Some(8));
    }

    #[test]
    fn test_collection_spec_defaults() {
        let spec = CollectionSpec::new("entities", 384);
        assert_eq!(
            spec.id_kind,
            IdKind::FixedLengthString { max_length: 64 }
        );
        assert_eq!(Metric::default().as_str(), "COSINE");
    }
}
