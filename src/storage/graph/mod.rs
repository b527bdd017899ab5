//! Graph storage backends for knowledge graph operations.
//!
//! This module provides implementations of the [`GraphStorage`] trait for
//! storing entities as nodes and relationships as undirected edges.
//!
//! # Available Backends
//!
//! | Backend | Use Case | Features |
//! |---------|----------|----------|
//! | [`InMemoryGraphStorage`] | Default; testing | Fast, no persistence |
//!
//! # Example
//!
//! ```rust,ignore
//! use ragstore::storage::graph::InMemoryGraphStorage;
//! use ragstore::storage::traits::GraphStorage;
//!
//! let graph = InMemoryGraphStorage::new("chunk_entity_relation");
//! graph.upsert_edge("ALICE", "ACME", attributes).await?;
//! assert_eq!(graph.node_degree("ALICE").await?, 1);
//! ```

mod memory;

pub use memory::InMemoryGraphStorage;

// Re-export trait for convenience
pub use crate::storage::traits::{GraphAttributes, GraphStorage};
