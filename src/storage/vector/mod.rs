//! Vector backend implementations.
//!
//! [`IndexedVectorStorage`] implements [`VectorStorage`](crate::storage::traits::VectorStorage)
//! over any [`VectorIndexClient`]:
//!
//! | Client | Backend |
//! |--------|---------|
//! | [`InMemoryIndexClient`] | In-process brute-force cosine index |
//! | [`MilvusClient`] | Milvus RESTful API v2 |

mod batching;
mod client;
mod indexed;
mod memory;
mod milvus;

pub use batching::{batch_count, effective_batch_size, partition, reassemble};
pub use client::{
    CollectionSpec, DEFAULT_ID_MAX_LENGTH, IdKind, IndexRecord, Metric, SearchHit, SearchRequest,
    VectorIndexClient, ensure_collection,
};
pub use indexed::IndexedVectorStorage;
pub use memory::InMemoryIndexClient;
pub use milvus::MilvusClient;
