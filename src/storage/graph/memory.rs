//! In-memory graph storage.
//!
//! An undirected attribute graph kept in process memory. Edges are stored
//! once under a normalized `(min, max)` key and indexed per node for
//! neighbor lookups.

use crate::storage::traits::{GraphAttributes, GraphStorage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

/// In-memory graph storage.
///
/// Uses `RwLock` for thread-safe access with reader-writer semantics.
/// Data is not persisted between runs.
#[derive(Debug)]
pub struct InMemoryGraphStorage {
    namespace: String,
    graph: RwLock<Graph>,
}

#[derive(Debug, Default)]
struct Graph {
    nodes: HashMap<String, GraphAttributes>,
    edges: BTreeMap<(String, String), GraphAttributes>,
    adjacency: HashMap<String, BTreeSet<String>>,
}

/// Normalizes an undirected edge key.
fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl InMemoryGraphStorage {
    /// Creates an empty graph for the namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            graph: RwLock::new(Graph::default()),
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.read().map(|g| g.nodes.len()).unwrap_or(0)
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.read().map(|g| g.edges.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Graph>> {
        self.graph.read().map_err(|e| Error::operation("graph_read", e))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Graph>> {
        self.graph.write().map_err(|e| Error::operation("graph_write", e))
    }
}

#[async_trait]
impl GraphStorage for InMemoryGraphStorage {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn has_node(&self, node_id: &str) -> Result<bool> {
        Ok(self.read()?.nodes.contains_key(node_id))
    }

    async fn has_edge(&self, source: &str, target: &str) -> Result<bool> {
        Ok(self.read()?.edges.contains_key(&edge_key(source, target)))
    }

    async fn node_degree(&self, node_id: &str) -> Result<usize> {
        Ok(self
            .read()?
            .adjacency
            .get(node_id)
            .map_or(0, BTreeSet::len))
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<GraphAttributes>> {
        Ok(self.read()?.nodes.get(node_id).cloned())
    }

    async fn get_edge(&self, source: &str, target: &str) -> Result<Option<GraphAttributes>> {
        Ok(self.read()?.edges.get(&edge_key(source, target)).cloned())
    }

    async fn get_node_edges(&self, node_id: &str) -> Result<Option<Vec<(String, String)>>> {
        let graph = self.read()?;
        if !graph.nodes.contains_key(node_id) {
            return Ok(None);
        }
        Ok(Some(
            graph
                .adjacency
                .get(node_id)
                .into_iter()
                .flatten()
                .map(|neighbor| (node_id.to_string(), neighbor.clone()))
                .collect(),
        ))
    }

    async fn upsert_node(&self, node_id: &str, attributes: GraphAttributes) -> Result<()> {
        self.write()?.nodes.insert(node_id.to_string(), attributes);
        Ok(())
    }

    async fn upsert_edge(
        &self,
        source: &str,
        target: &str,
        attributes: GraphAttributes,
    ) -> Result<()> {
        let mut graph = self.write()?;
        for node in [source, target] {
            graph.nodes.entry(node.to_string()).or_default();
        }
        graph
            .adjacency
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string());
        graph
            .adjacency
            .entry(target.to_string())
            .or_default()
            .insert(source.to_string());
        graph.edges.insert(edge_key(source, target), attributes);
        drop(graph);
        Ok(())
    }
}
