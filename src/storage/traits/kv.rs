//! Key-value storage trait.

use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A stored value: a flat JSON object.
pub type KvRecord = Map<String, Value>;

/// Trait for key-value document stores (full documents, text chunks, LLM
/// response caches).
///
/// Shares the vector storage lifecycle: one namespace per instance, and
/// [`index_done`](KvStorage::index_done) marks the end of an indexing run.
#[async_trait]
pub trait KvStorage: Send + Sync {
    /// Returns the namespace.
    fn namespace(&self) -> &str;

    /// Returns every stored key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn all_keys(&self) -> Result<Vec<String>>;

    /// Returns the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get_by_id(&self, id: &str) -> Result<Option<KvRecord>>;

    /// Returns records for `ids`, positionally (`None` for missing keys).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Option<KvRecord>>>;

    /// Returns the subset of `keys` not yet stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn filter_keys(&self, keys: &[String]) -> Result<BTreeSet<String>>;

    /// Inserts records whose keys are not yet stored; existing keys are kept.
    ///
    /// Returns the records actually inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn upsert(&self, data: BTreeMap<String, KvRecord>) -> Result<BTreeMap<String, KvRecord>>;

    /// Removes every record in the namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn drop_all(&self) -> Result<()>;

    /// Called once an indexing run finishes; persists pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    async fn index_done(&self) -> Result<()> {
        Ok(())
    }
}
