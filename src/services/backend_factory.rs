//! Backend factory for storage layer initialization.
//!
//! This module centralizes backend creation so retrieval code only ever sees
//! `Arc<dyn _>` storage handles.
//!
//! # Architecture
//!
//! ```text
//! BackendFactory
//!   ├── create_embedder() → Arc<dyn Embedder>
//!   ├── create_vector_storage() → Arc<dyn VectorStorage>
//!   ├── create_kv_storage() → Arc<dyn KvStorage>
//!   ├── create_graph_storage() → Arc<dyn GraphStorage>
//!   └── create_storage_set() → StorageSet
//! ```
//!
//! # Standard Namespaces
//!
//! | Family | Namespace | Extra metadata fields |
//! |--------|-----------|-----------------------|
//! | KV | `full_docs`, `text_chunks`, `llm_response_cache` | |
//! | Vector | `entities` | `entity_name` |
//! | Vector | `relationships` | `src_id`, `tgt_id` |
//! | Vector | `chunks` | |
//! | Graph | `chunk_entity_relation` | |

use crate::config::{EmbeddingProvider, RagstoreConfig, VectorBackendKind};
use crate::embedding::{BulkheadEmbedder, Embedder, HashEmbedder, OpenAiEmbedder};
use crate::storage::traits::{GraphStorage, KvStorage, VectorStorage};
use crate::storage::{
    InMemoryGraphStorage, InMemoryIndexClient, IndexedVectorStorage, JsonKvStorage, MilvusClient,
    StorageSet,
};
use crate::Result;
use secrecy::ExposeSecret;
use std::sync::Arc;

/// KV namespaces of a standard storage set.
pub const KV_NAMESPACES: [&str; 3] = ["full_docs", "text_chunks", "llm_response_cache"];

/// Vector namespaces of a standard storage set with their own metadata fields.
pub const VECTOR_NAMESPACES: [(&str, &[&str]); 3] = [
    ("entities", &["entity_name"]),
    ("relationships", &["src_id", "tgt_id"]),
    ("chunks", &[]),
];

/// Graph namespace of a standard storage set.
pub const GRAPH_NAMESPACE: &str = "chunk_entity_relation";

/// Factory for creating storage backends.
///
/// Vector namespaces on the memory backend share one in-process index, so
/// every storage created by the same factory sees the same collections.
///
/// # Example
///
/// ```rust,ignore
/// use ragstore::services::BackendFactory;
/// use ragstore::RagstoreConfig;
///
/// let factory = BackendFactory::new(RagstoreConfig::load_default()?);
/// let storages = factory.create_storage_set().await?;
/// let chunks = storages.vector("chunks").expect("standard namespace");
/// ```
pub struct BackendFactory {
    config: RagstoreConfig,
    memory_index: Arc<InMemoryIndexClient>,
}

impl BackendFactory {
    /// Creates a factory for the given configuration.
    #[must_use]
    pub fn new(config: RagstoreConfig) -> Self {
        Self {
            config,
            memory_index: Arc::new(InMemoryIndexClient::new()),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RagstoreConfig {
        &self.config
    }

    /// Returns the shared in-process index used by the memory backend.
    #[must_use]
    pub fn memory_index(&self) -> Arc<InMemoryIndexClient> {
        Arc::clone(&self.memory_index)
    }

    /// Creates the configured embedder, wrapped in a concurrency bulkhead.
    #[must_use]
    pub fn create_embedder(&self) -> Arc<dyn Embedder> {
        let settings = &self.config.embedding;
        let bulkhead = settings.bulkhead();

        match settings.provider {
            EmbeddingProvider::Hash => {
                let inner = HashEmbedder::with_dimensions(settings.dimensions)
                    .with_max_batch_size(settings.max_batch_size);
                Arc::new(BulkheadEmbedder::new(inner, bulkhead))
            },
            EmbeddingProvider::OpenAi => {
                let mut inner =
                    OpenAiEmbedder::new().with_max_batch_size(settings.max_batch_size);
                if let Some(model) = &settings.model {
                    inner = inner.with_model(model.clone(), settings.dimensions);
                }
                if let Some(url) = &settings.base_url {
                    inner = inner.with_endpoint(url.clone());
                }
                if let Some(key) = &settings.api_key {
                    inner = inner.with_api_key(key.expose_secret());
                }
                tracing::info!(model = inner.model(), "Using OpenAI-compatible embedder");
                Arc::new(BulkheadEmbedder::new(inner, bulkhead))
            },
        }
    }

    /// Builds a vector storage without contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace configuration is invalid.
    pub fn build_vector_storage(
        &self,
        namespace: &str,
        extra_meta_fields: &[&str],
        embedder: Arc<dyn Embedder>,
    ) -> Result<Arc<dyn VectorStorage>> {
        let mut config = self.config.vector_storage(namespace);
        config
            .meta_fields
            .extend(extra_meta_fields.iter().map(|f| (*f).to_string()));

        let storage: Arc<dyn VectorStorage> = match self.config.vector.backend {
            VectorBackendKind::Memory => Arc::new(IndexedVectorStorage::new(
                self.memory_index(),
                embedder,
                config,
            )?),
            VectorBackendKind::Milvus => {
                let mut client = MilvusClient::new(self.config.milvus.uri.clone());
                if let Some(token) = &self.config.milvus.token {
                    client = client.with_token(token.clone());
                }
                Arc::new(IndexedVectorStorage::new(client, embedder, config)?)
            },
        };
        Ok(storage)
    }

    /// Creates a vector storage and ensures its collection exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the backend
    /// cannot create the collection.
    pub async fn create_vector_storage(
        &self,
        namespace: &str,
        extra_meta_fields: &[&str],
        embedder: Arc<dyn Embedder>,
    ) -> Result<Arc<dyn VectorStorage>> {
        let storage = self.build_vector_storage(namespace, extra_meta_fields, embedder)?;
        storage.ensure_collection().await?;
        tracing::info!(
            namespace,
            backend = self.config.vector.backend.as_str(),
            "Vector storage ready"
        );
        Ok(storage)
    }

    /// Creates a key-value storage in the configured working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be opened.
    pub fn create_kv_storage(&self, namespace: &str) -> Result<Arc<dyn KvStorage>> {
        Ok(Arc::new(JsonKvStorage::open(
            &self.config.kv.working_dir,
            namespace,
        )?))
    }

    /// Creates a graph storage.
    #[must_use]
    pub fn create_graph_storage(&self, namespace: &str) -> Arc<dyn GraphStorage> {
        Arc::new(InMemoryGraphStorage::new(namespace))
    }

    /// Creates the standard storage set sharing one embedder.
    ///
    /// # Errors
    ///
    /// Returns an error if any member fails to initialize.
    pub async fn create_storage_set(&self) -> Result<StorageSet> {
        let embedder = self.create_embedder();
        let mut set = StorageSet::new();

        for namespace in KV_NAMESPACES {
            set = set.with_kv(self.create_kv_storage(namespace)?);
        }
        for (namespace, fields) in VECTOR_NAMESPACES {
            let storage = self
                .create_vector_storage(namespace, fields, Arc::clone(&embedder))
                .await?;
            set = set.with_vector(storage);
        }
        set = set.with_graph(self.create_graph_storage(GRAPH_NAMESPACE));

        Ok(set)
    }
}

impl Default for BackendFactory {
    fn default() -> Self {
        Self::new(RagstoreConfig::default())
    }
}
