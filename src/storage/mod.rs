//! Storage layer abstraction.
//!
//! This module provides the three storage families a retrieval pipeline
//! persists into:
//! - **KV**: Full documents, text chunks and response caches (JSON file)
//! - **Vector**: Embedding similarity search (in-memory index, Milvus)
//! - **Graph**: Entities and relationships (in-memory)

// Allow cast precision loss for metric values where exact precision is not critical.
#![allow(clippy::cast_precision_loss)]
// Allow significant_drop_tightening - guards are released explicitly where it matters.
#![allow(clippy::significant_drop_tightening)]

pub mod graph;
pub mod kv;
pub mod traits;
pub mod vector;

pub use graph::InMemoryGraphStorage;
pub use kv::JsonKvStorage;
pub use traits::{GraphStorage, KvStorage, VectorStorage};
pub use vector::{InMemoryIndexClient, IndexedVectorStorage, MilvusClient};

use crate::Result;
use futures::future::try_join_all;
use std::sync::Arc;

/// Composite storage combining all three families.
///
/// Each member is held behind an `Arc<dyn _>`, so callers never depend on a
/// concrete backend.
#[derive(Clone)]
pub struct StorageSet {
    kv: Vec<Arc<dyn KvStorage>>,
    vector: Vec<Arc<dyn VectorStorage>>,
    graph: Vec<Arc<dyn GraphStorage>>,
}

impl StorageSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            kv: Vec::new(),
            vector: Vec::new(),
            graph: Vec::new(),
        }
    }

    /// Adds a key-value namespace.
    #[must_use]
    pub fn with_kv(mut self, storage: Arc<dyn KvStorage>) -> Self {
        self.kv.push(storage);
        self
    }

    /// Adds a vector namespace.
    #[must_use]
    pub fn with_vector(mut self, storage: Arc<dyn VectorStorage>) -> Self {
        self.vector.push(storage);
        self
    }

    /// Adds a graph namespace.
    #[must_use]
    pub fn with_graph(mut self, storage: Arc<dyn GraphStorage>) -> Self {
        self.graph.push(storage);
        self
    }

    /// Returns the key-value namespace with the given name.
    #[must_use]
    pub fn kv(&self, namespace: &str) -> Option<&Arc<dyn KvStorage>> {
        self.kv.iter().find(|s| s.namespace() == namespace)
    }

    /// Returns the vector namespace with the given name.
    #[must_use]
    pub fn vector(&self, namespace: &str) -> Option<&Arc<dyn VectorStorage>> {
        self.vector.iter().find(|s| s.namespace() == namespace)
    }

    /// Returns the graph namespace with the given name.
    #[must_use]
    pub fn graph(&self, namespace: &str) -> Option<&Arc<dyn GraphStorage>> {
        self.graph.iter().find(|s| s.namespace() == namespace)
    }

    /// Returns the number of namespaces across all families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kv.len() + self.vector.len() + self.graph.len()
    }

    /// Returns true if the set holds no namespaces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signals the end of an indexing run to every namespace concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error any member reports.
    pub async fn index_done_all(&self) -> Result<()> {
        let kv = try_join_all(self.kv.iter().map(|s| s.index_done()));
        let vector = try_join_all(self.vector.iter().map(|s| s.index_done()));
        let graph = try_join_all(self.graph.iter().map(|s| s.index_done()));
        futures::try_join!(kv, vector, graph)?;

        tracing::info!(namespaces = self.len(), "Index run finished");
        Ok(())
    }

    /// Releases the backend clients of every vector storage.
    ///
    /// # Errors
    ///
    /// Returns the first error any vector storage reports.
    pub async fn close_all(&self) -> Result<()> {
        try_join_all(self.vector.iter().map(|s| s.close())).await?;
        tracing::debug!(vector = self.vector.len(), "Closed storage set");
        Ok(())
    }
}

impl Default for StorageSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StorageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSet")
            .field("kv", &self.kv.iter().map(|s| s.namespace()).collect::<Vec<_>>())
            .field("vector", &self.vector.iter().map(|s| s.namespace()).collect::<Vec<_>>())
            .field("graph", &self.graph.iter().map(|s| s.namespace()).collect::<Vec<_>>())
            .finish()
    }
}
