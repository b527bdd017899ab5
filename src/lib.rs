//! # Ragstore
//!
//! Pluggable persistence for retrieval-augmented generation pipelines.
//!
//! Ragstore puts a uniform contract over heterogeneous backends so that
//! indexing and retrieval code never depends on a concrete database.
//!
//! ## Features
//!
//! - Three storage families: key-value documents, vector similarity, knowledge graph
//! - Batched, concurrent embedding on upsert with strict order reassembly
//! - Top-k cosine queries with per-namespace metadata projection
//! - Pluggable index clients (in-memory reference index, Milvus REST)
//! - Pluggable embedders (deterministic hash embedder, OpenAI-compatible HTTP)
//!
//! ## Example
//!
//! ```rust,ignore
//! use ragstore::embedding::HashEmbedder;
//! use ragstore::storage::vector::{InMemoryIndexClient, IndexedVectorStorage};
//! use ragstore::storage::traits::VectorStorage;
//! use ragstore::config::VectorStorageConfig;
//!
//! let config = VectorStorageConfig::new("chunks").with_meta_fields(["doc_id"]);
//! let storage = IndexedVectorStorage::connect(
//!     InMemoryIndexClient::new(),
//!     HashEmbedder::new(),
//!     config,
//! )
//! .await?;
//! let hits = storage.query("database decisions", 5).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod embedding;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{RagstoreConfig, VectorStorageConfig};
pub use embedding::Embedder;
pub use models::{Document, DocumentBatch, QueryHit, UpsertConfirmation};
pub use services::{BackendFactory, StorageSet};
pub use storage::traits::{GraphStorage, KvStorage, VectorStorage};

/// Error type for ragstore operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Reserved metadata field names, vector dimension mismatch, empty text |
/// | `OperationFailed` | Embedding calls, backend calls, file I/O or HTTP fail |
/// | `FeatureNotEnabled` | Selecting a backend or provider this build does not support |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A metadata field collides with a reserved hit field (`id`, `distance`, `vector`)
    /// - A vector does not match the collection dimension
    /// - An embedder is asked to embed empty text
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - An embedding batch call fails or returns the wrong number of vectors
    /// - The vector index rejects a create, upsert or search call
    /// - Reading or writing a JSON store file fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled or not supported by this build.
    #[error("feature not enabled: {0}")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for ragstore operations.
pub type Result<T> = std::result::Result<T, Error>;
