//! Chaos testing for concurrent access.
//!
//! Shares one storage handle across many tasks to find lost writes and
//! deadlocks:
//! - Concurrent upserts into one vector namespace
//! - Mixed upsert and query workloads
//! - Concurrent KV inserts racing on the same keys

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::cast_precision_loss
)]

use ragstore::config::VectorStorageConfig;
use ragstore::embedding::HashEmbedder;
use ragstore::models::{Document, DocumentBatch};
use ragstore::storage::traits::{KvRecord, KvStorage, VectorStorage};
use ragstore::storage::vector::{InMemoryIndexClient, IndexedVectorStorage};
use ragstore::storage::JsonKvStorage;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

async fn shared_storage() -> Arc<IndexedVectorStorage<InMemoryIndexClient, HashEmbedder>> {
    Arc::new(
        IndexedVectorStorage::connect(
            InMemoryIndexClient::new(),
            HashEmbedder::with_dimensions(32),
            VectorStorageConfig::new("chaos").with_max_batch_size(3),
        )
        .await
        .unwrap(),
    )
}

/// Test: Concurrent upserts from many tasks should not lose writes.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_no_lost_writes() {
    let storage = shared_storage().await;
    let num_tasks = 8;
    let docs_per_task = 10;

    let handles: Vec<_> = (0..num_tasks)
        .map(|t| {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                let batch: DocumentBatch = (0..docs_per_task)
                    .map(|i| {
                        (
                            format!("t{t}-d{i}"),
                            Document::with_content(format!("task {t} document {i}")),
                        )
                    })
                    .collect();
                storage.upsert(batch).await.unwrap()
            })
        })
        .collect();

    for handle in handles {
        let confirmation = handle.await.unwrap();
        assert_eq!(confirmation.upsert_count, docs_per_task);
    }

    assert_eq!(
        storage.client().count("chaos"),
        Some(num_tasks * docs_per_task)
    );
}

/// Test: Mixed upsert/query workload should complete without errors.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_workload() {
    let storage = shared_storage().await;
    let completed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..12)
        .map(|t| {
            let storage = Arc::clone(&storage);
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                if t % 3 == 0 {
                    let mut batch = DocumentBatch::new();
                    batch.insert(format!("w{t}"), Document::with_content(format!("writer {t}")));
                    storage.upsert(batch).await.unwrap();
                } else {
                    let hits = storage.query("writer", 5).await.unwrap();
                    assert!(hits.len() <= 5);
                }
                completed.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(completed.load(Ordering::SeqCst), 12);
}

/// Test: Racing KV inserts on the same key keep exactly one winner.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_kv_inserts_single_winner() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonKvStorage::open(dir.path(), "text_chunks").unwrap());

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut record = KvRecord::new();
                record.insert("writer".to_string(), serde_json::json!(t));
                store
                    .upsert(BTreeMap::from([("shared".to_string(), record)]))
                    .await
                    .unwrap()
                    .len()
            })
        })
        .collect();

    let mut inserted = 0;
    for handle in handles {
        inserted += handle.await.unwrap();
    }

    assert_eq!(inserted, 1);
    assert_eq!(store.all_keys().await.unwrap(), vec!["shared"]);
}
