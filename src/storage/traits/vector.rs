//! Vector storage trait.
//!
//! The abstraction retrieval pipelines hold for embedding-backed similarity
//! search. Callers see only `Arc<dyn VectorStorage>`; the concrete index
//! client and embedder stay behind it.
//!
//! # Available Implementations
//!
//! | Implementation | Backend |
//! |----------------|---------|
//! | `IndexedVectorStorage<InMemoryIndexClient, _>` | In-process brute-force cosine index |
//! | `IndexedVectorStorage<MilvusClient, _>` | Milvus via REST |
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use ragstore::storage::traits::VectorStorage;
//! use ragstore::models::{Document, DocumentBatch};
//!
//! let mut batch = DocumentBatch::new();
//! batch.insert("chunk-1".into(), Document::with_content("Milvus stores vectors"));
//! storage.upsert(batch).await?;
//!
//! for hit in storage.query("where are vectors stored?", 5).await? {
//!     println!("{} {:.3}", hit.id, hit.distance);
//! }
//! ```

use crate::Result;
use crate::models::{DocumentBatch, QueryHit, UpsertConfirmation};
use async_trait::async_trait;

/// Trait for vector storage namespaces.
///
/// One instance is bound to one namespace and one embedding dimension for
/// its lifetime.
///
/// # Implementor Notes
///
/// - Methods take `&self` so instances can be shared via `Arc<dyn VectorStorage>`
/// - No locking is imposed; concurrent upserts are as safe as the backend client
#[async_trait]
pub trait VectorStorage: Send + Sync {
    /// Returns the namespace (collection name).
    fn namespace(&self) -> &str;

    /// Returns the hit count used by [`query_default`](VectorStorage::query_default).
    fn default_top_k(&self) -> usize {
        crate::config::DEFAULT_TOP_K
    }

    /// Creates the backing collection if it does not exist.
    ///
    /// Idempotent. An existing collection is not checked against the
    /// embedding dimension.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend existence check or create call fails.
    async fn ensure_collection(&self) -> Result<()>;

    /// Embeds and writes documents, replacing records with the same key.
    ///
    /// Documents without a string `content` field are skipped and logged.
    /// Returns the empty confirmation when nothing was written.
    ///
    /// # Errors
    ///
    /// Returns an error if any embedding batch fails (nothing is written) or
    /// the backend rejects the bulk upsert.
    async fn upsert(&self, documents: DocumentBatch) -> Result<UpsertConfirmation>;

    /// Returns up to `top_k` hits for `text`, best match first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or the backend search fails.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>>;

    /// Queries with [`default_top_k`](VectorStorage::default_top_k) hits.
    ///
    /// # Errors
    ///
    /// Same as [`query`](VectorStorage::query).
    async fn query_default(&self, text: &str) -> Result<Vec<QueryHit>> {
        self.query(text, self.default_top_k()).await
    }

    /// Called once an indexing run finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing backend state fails.
    async fn index_done(&self) -> Result<()> {
        Ok(())
    }

    /// Releases the backend client. Call once, when the storage is retired.
    ///
    /// # Errors
    ///
    /// Returns an error if the client fails to release its connection.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
