//! Integration tests for ragstore.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::too_many_lines,
    clippy::cast_precision_loss
)]

use async_trait::async_trait;
use ragstore::config::VectorStorageConfig;
use ragstore::embedding::{BulkheadEmbedder, Embedder, EmbeddingBulkheadConfig, HashEmbedder};
use ragstore::models::{Document, DocumentBatch};
use ragstore::services::BackendFactory;
use ragstore::storage::vector::{InMemoryIndexClient, IndexedVectorStorage};
use ragstore::{Error, RagstoreConfig, Result, VectorStorage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("test message".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("test message"));

    let err = Error::OperationFailed {
        operation: "milvus_upsert".to_string(),
        cause: "connection refused".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("milvus_upsert"));
    assert!(display.contains("connection refused"));

    let err = Error::FeatureNotEnabled("qdrant".to_string());
    let display = format!("{err}");
    assert!(display.contains("not enabled"));
    assert!(display.contains("qdrant"));
}

/// Counts calls and texts passed to the wrapped embedder.
struct CountingEmbedder<E> {
    inner: E,
    calls: AtomicUsize,
    texts: AtomicUsize,
}

impl<E> CountingEmbedder<E> {
    const fn new(inner: E) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            texts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CountingEmbedder<E> {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

fn corpus() -> DocumentBatch {
    [
        ("chunk-1", "PostgreSQL connection pooling with PgBouncer", "doc-a"),
        ("chunk-2", "Rust async runtimes and the tokio scheduler", "doc-a"),
        ("chunk-3", "Milvus stores float vectors in collections", "doc-b"),
        ("chunk-4", "Cosine similarity compares vector directions", "doc-b"),
        ("chunk-5", "Knowledge graphs link entities with relationships", "doc-c"),
    ]
    .into_iter()
    .map(|(id, content, doc)| {
        (
            id.to_string(),
            Document::with_content(content)
                .with_field("full_doc_id", doc)
                .with_field("tokens", 8),
        )
    })
    .collect()
}

#[tokio::test]
async fn test_upsert_then_query_finds_inserted_text() {
    let config = VectorStorageConfig::new("chunks")
        .with_meta_fields(["full_doc_id"])
        .with_max_batch_size(2);
    let embedder = Arc::new(CountingEmbedder::new(HashEmbedder::with_dimensions(64)));
    let storage: Arc<dyn VectorStorage> = Arc::new(
        IndexedVectorStorage::connect(InMemoryIndexClient::new(), Arc::clone(&embedder), config)
            .await
            .unwrap(),
    );

    let confirmation = storage.upsert(corpus()).await.unwrap();
    assert_eq!(confirmation.upsert_count, 5);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    assert_eq!(embedder.texts.load(Ordering::SeqCst), 5);

    let hits = storage
        .query("Milvus stores float vectors in collections", 2)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "chunk-3");
    assert!(hits[0].distance > 0.99);
    assert!(hits[0].distance >= hits[1].distance);
    assert_eq!(hits[0].get("full_doc_id"), Some(&serde_json::json!("doc-b")));
    assert!(hits[0].get("tokens").is_none());
    assert!(hits[0].get("content").is_none());
}

#[tokio::test]
async fn test_reupsert_replaces_record() {
    let storage = IndexedVectorStorage::connect(
        InMemoryIndexClient::new(),
        HashEmbedder::with_dimensions(64),
        VectorStorageConfig::new("chunks"),
    )
    .await
    .unwrap();

    storage.upsert(corpus()).await.unwrap();
    let mut update = DocumentBatch::new();
    update.insert(
        "chunk-1".to_string(),
        Document::with_content("Graph databases for entity storage"),
    );
    storage.upsert(update).await.unwrap();

    assert_eq!(storage.client().count("chunks"), Some(5));
    let hits = storage
        .query("Graph databases for entity storage", 1)
        .await
        .unwrap();
    assert_eq!(hits[0].id, "chunk-1");
}

#[tokio::test]
async fn test_query_default_uses_configured_top_k() {
    let storage = IndexedVectorStorage::connect(
        InMemoryIndexClient::new(),
        HashEmbedder::with_dimensions(32),
        VectorStorageConfig::new("chunks").with_default_top_k(3),
    )
    .await
    .unwrap();
    storage.upsert(corpus()).await.unwrap();

    assert_eq!(storage.query_default("vectors").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_bulkhead_embedder_in_pipeline() {
    let embedder = BulkheadEmbedder::new(
        HashEmbedder::with_dimensions(16),
        EmbeddingBulkheadConfig::new().with_max_concurrent(1),
    );
    let storage = IndexedVectorStorage::connect(
        InMemoryIndexClient::new(),
        embedder,
        VectorStorageConfig::new("chunks").with_max_batch_size(1),
    )
    .await
    .unwrap();

    let confirmation = storage.upsert(corpus()).await.unwrap();
    assert_eq!(confirmation.upsert_ids.len(), 5);
    assert_eq!(storage.embedder().available_permits(), 1);
}

#[tokio::test]
async fn test_factory_storage_set_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut config = RagstoreConfig::default().with_working_dir(dir.path());
    config.embedding.dimensions = 48;
    let set = BackendFactory::new(config).create_storage_set().await.unwrap();

    let chunks = set.vector("chunks").unwrap();
    chunks.upsert(corpus()).await.unwrap();
    let hits = chunks
        .query("Knowledge graphs link entities with relationships", 1)
        .await
        .unwrap();
    assert_eq!(hits[0].id, "chunk-5");

    set.index_done_all().await.unwrap();
    for namespace in ["full_docs", "text_chunks", "llm_response_cache"] {
        assert!(dir.path().join(format!("kv_store_{namespace}.json")).exists());
    }
}
