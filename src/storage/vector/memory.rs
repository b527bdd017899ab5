//! In-process vector index.
//!
//! A brute-force O(n) index client used for tests, examples and small local
//! pipelines. Behaves like a remote index where it matters to callers:
//! collections must exist before use, ids are bounded strings, vectors must
//! match the collection dimension, and upserts replace by id.

use super::client::{
    CollectionSpec, IdKind, IndexRecord, Metric, SearchHit, SearchRequest, VectorIndexClient,
};
use crate::embedding::cosine_similarity;
use crate::models::UpsertConfirmation;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector index client.
///
/// Uses `RwLock` for thread-safe access. Data is not persisted.
#[derive(Debug, Default)]
pub struct InMemoryIndexClient {
    collections: RwLock<HashMap<String, Collection>>,
}

#[derive(Debug)]
struct Collection {
    dimension: usize,
    id_kind: IdKind,
    records: HashMap<String, StoredRecord>,
}

#[derive(Debug)]
struct StoredRecord {
    vector: Vec<f32>,
    metadata: Map<String, Value>,
}

impl InMemoryIndexClient {
    /// Creates an empty client with no collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in a collection.
    #[must_use]
    pub fn count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).map(|col| col.records.len()))
    }

    /// Returns the declared dimension of a collection.
    #[must_use]
    pub fn dimension(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).map(|col| col.dimension))
    }

    /// Removes a collection. Returns true if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn drop_collection(&self, collection: &str) -> Result<bool> {
        let mut collections = self.write_lock("memory_drop_collection")?;
        Ok(collections.remove(collection).is_some())
    }

    fn read_lock(
        &self,
        operation: &str,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|e| Error::operation(operation, e))
    }

    fn write_lock(
        &self,
        operation: &str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|e| Error::operation(operation, e))
    }

    fn missing(operation: &str, collection: &str) -> Error {
        Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("collection '{collection}' does not exist"),
        }
    }
}

impl Collection {
    fn validate(&self, record: &IndexRecord) -> Result<()> {
        let IdKind::FixedLengthString { max_length } = self.id_kind;
        if record.id.is_empty() || record.id.len() > max_length {
            return Err(Error::InvalidInput(format!(
                "id '{}' must be 1..={max_length} bytes",
                record.id
            )));
        }
        if record.vector.len() != self.dimension {
            return Err(Error::InvalidInput(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                record.vector.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndexClient for InMemoryIndexClient {
    async fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.read_lock("memory_has_collection")?.contains_key(name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        if spec.dimension == 0 {
            return Err(Error::InvalidInput(
                "collection dimension must be positive".to_string(),
            ));
        }

        let mut collections = self.write_lock("memory_create_collection")?;
        if collections.contains_key(&spec.name) {
            return Err(Error::OperationFailed {
                operation: "memory_create_collection".to_string(),
                cause: format!("collection '{}' already exists", spec.name),
            });
        }
        collections.insert(
            spec.name.clone(),
            Collection {
                dimension: spec.dimension,
                id_kind: spec.id_kind,
                records: HashMap::new(),
            },
        );
        drop(collections);
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<IndexRecord>,
    ) -> Result<UpsertConfirmation> {
        let mut collections = self.write_lock("memory_upsert")?;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing("memory_upsert", collection))?;

        // Validate the whole batch first so a bad record writes nothing.
        for record in &records {
            target.validate(record)?;
        }

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        for record in records {
            target.records.insert(
                record.id,
                StoredRecord {
                    vector: record.vector,
                    metadata: record.metadata,
                },
            );
        }
        drop(collections);

        Ok(UpsertConfirmation::for_ids(ids))
    }

    async fn search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchHit>> {
        let collections = self.read_lock("memory_search")?;
        let target = collections
            .get(request.collection)
            .ok_or_else(|| Self::missing("memory_search", request.collection))?;

        if request.vector.len() != target.dimension {
            return Err(Error::InvalidInput(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                target.dimension,
                request.vector.len()
            )));
        }

        let mut scored: Vec<(&String, &StoredRecord, f32)> = target
            .records
            .iter()
            .map(|(id, record)| {
                let score = match request.metric {
                    Metric::Cosine => cosine_similarity(request.vector, &record.vector),
                };
                (id, record, score)
            })
            .collect();

        // Best first; ties broken by id for stable output.
        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        Ok(scored
            .into_iter()
            .take(request.limit)
            .map(|(id, record, score)| SearchHit {
                id: id.clone(),
                distance: score,
                entity: request
                    .output_fields
                    .iter()
                    .filter_map(|f| record.metadata.get(f).map(|v| (f.clone(), v.clone())))
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, vector: Vec<f32>, title: &str) -> IndexRecord {
        let mut metadata = Map::new();
        metadata.insert("title".to_string(), json!(title));
        metadata.insert("secret".to_string(), json!("hidden"));
        IndexRecord {
            id: id.to_string(),
            vector,
            metadata,
        }
    }

    async fn client_with_collection(dimension: usize) -> InMemoryIndexClient {
        let client = InMemoryIndexClient::new();
        client
            .create_collection(&CollectionSpec::new("docs", dimension))
            .await
            .unwrap();
        client
    }

    fn request<'a>(vector: &'a [f32], limit: usize, fields: &'a [String]) -> SearchRequest<'a> {
        SearchRequest {
            collection: "docs",
            vector,
            limit,
            output_fields: fields,
            metric: Metric::Cosine,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_search_ranked() {
        let client = client_with_collection(2).await;
        client
            .upsert(
                "docs",
                vec![
                    record("a", vec![1.0, 0.0], "A"),
                    record("b", vec![0.0, 1.0], "B"),
                    record("c", vec![0.7, 0.7], "C"),
                ],
            )
            .await
            .unwrap();

        let fields = vec!["title".to_string()];
        let hits = client.search(request(&[1.0, 0.1], 2, &fields)).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert!(hits[0].distance > hits[1].distance);
        assert_eq!(hits[0].entity.get("title"), Some(&json!("A")));
        assert!(!hits[0].entity.contains_key("secret"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let client = client_with_collection(2).await;
        client
            .upsert("docs", vec![record("a", vec![1.0, 0.0], "old")])
            .await
            .unwrap();
        client
            .upsert("docs", vec![record("a", vec![0.0, 1.0], "new")])
            .await
            .unwrap();

        assert_eq!(client.count("docs"), Some(1));
        let fields = vec!["title".to_string()];
        let hits = client.search(request(&[0.0, 1.0], 1, &fields)).await.unwrap();
        assert_eq!(hits[0].entity.get("title"), Some(&json!("new")));
    }

    #[tokio::test]
    async fn test_search_empty_collection() {
        let client = client_with_collection(3).await;
        let hits = client.search(request(&[1.0, 0.0, 0.0], 5, &[])).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_writes_nothing() {
        let client = client_with_collection(2).await;
        let result = client
            .upsert(
                "docs",
                vec![record("a", vec![1.0, 0.0], "A"), record("b", vec![1.0], "B")],
            )
            .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(client.count("docs"), Some(0));
    }

    #[tokio::test]
    async fn test_id_too_long_rejected() {
        let client = client_with_collection(1).await;
        let long_id = "x".repeat(65);
        let result = client
            .upsert("docs", vec![record(&long_id, vec![1.0], "A")])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let client = InMemoryIndexClient::new();
        assert!(!client.has_collection("docs").await.unwrap());
        assert!(client.upsert("docs", Vec::new()).await.is_err());
        assert!(client.search(request(&[1.0], 1, &[])).await.is_err());
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let client = client_with_collection(2).await;
        let result = client
            .create_collection(&CollectionSpec::new("docs", 2))
            .await;
        assert!(result.is_err());
        assert!(client.drop_collection("docs").unwrap());
        assert!(!client.has_collection("docs").await.unwrap());
    }
}
