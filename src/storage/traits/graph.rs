//! Graph storage trait for knowledge graph storage.
//!
//! Nodes are entities keyed by name, edges are undirected relationships
//! between two node names. Both carry flat JSON attribute maps.

use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Attributes attached to a node or edge.
pub type GraphAttributes = Map<String, Value>;

/// Trait for knowledge graph backends.
///
/// # Implementor Notes
///
/// - Edges are undirected: `(a, b)` and `(b, a)` name the same edge
/// - Upserts merge by replacing the attribute map
#[async_trait]
pub trait GraphStorage: Send + Sync {
    /// Returns the namespace.
    fn namespace(&self) -> &str;

    /// Returns true if the node exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn has_node(&self, node_id: &str) -> Result<bool>;

    /// Returns true if an edge joins the two nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn has_edge(&self, source: &str, target: &str) -> Result<bool>;

    /// Returns the number of edges touching the node (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn node_degree(&self, node_id: &str) -> Result<usize>;

    /// Returns the sum of both endpoint degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn edge_degree(&self, source: &str, target: &str) -> Result<usize> {
        Ok(self.node_degree(source).await? + self.node_degree(target).await?)
    }

    /// Returns the node's attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get_node(&self, node_id: &str) -> Result<Option<GraphAttributes>>;

    /// Returns the edge's attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get_edge(&self, source: &str, target: &str) -> Result<Option<GraphAttributes>>;

    /// Returns `(node_id, neighbor)` pairs for every edge touching the node,
    /// or `None` if the node does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get_node_edges(&self, node_id: &str) -> Result<Option<Vec<(String, String)>>>;

    /// Inserts or replaces a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn upsert_node(&self, node_id: &str, attributes: GraphAttributes) -> Result<()>;

    /// Inserts or replaces an edge, creating missing endpoint nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn upsert_edge(&self, source: &str, target: &str, attributes: GraphAttributes)
    -> Result<()>;

    /// Called once an indexing run finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    async fn index_done(&self) -> Result<()> {
        Ok(())
    }
}
