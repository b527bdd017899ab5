//! JSON-file key-value storage.
//!
//! Holds a namespace in memory and writes it to
//! `{working_dir}/kv_store_{namespace}.json` when an indexing run finishes.
//! An existing file is loaded on open.

use crate::storage::traits::{KvRecord, KvStorage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Maximum size of a store file read on open (256MB).
const MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Key-value storage persisted as a single JSON object.
#[derive(Debug)]
pub struct JsonKvStorage {
    namespace: String,
    path: PathBuf,
    data: RwLock<BTreeMap<String, KvRecord>>,
}

impl JsonKvStorage {
    /// Opens the namespace, creating the working directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is not a safe file name, the
    /// directory cannot be created, or an existing file cannot be parsed.
    pub fn open(working_dir: impl AsRef<Path>, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        if !Self::is_safe_namespace(&namespace) {
            return Err(Error::InvalidInput(format!(
                "namespace contains invalid characters: {namespace}"
            )));
        }

        let working_dir = working_dir.as_ref();
        fs::create_dir_all(working_dir).map_err(|e| Error::operation("create_storage_dir", e))?;

        let path = working_dir.join(format!("kv_store_{namespace}.json"));
        let data = Self::load(&path)?;
        tracing::info!(
            namespace = %namespace,
            records = data.len(),
            path = %path.display(),
            "Loaded KV store"
        );

        Ok(Self {
            namespace,
            path,
            data: RwLock::new(data),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_safe_namespace(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 255
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    fn load(path: &Path) -> Result<BTreeMap<String, KvRecord>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let metadata = fs::metadata(path).map_err(|e| Error::operation("read_file_metadata", e))?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::InvalidInput(format!(
                "KV store file exceeds maximum size of {MAX_FILE_SIZE} bytes: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|e| Error::operation("read_kv_file", e))?;
        serde_json::from_str(&raw).map_err(|e| Error::operation("deserialize_kv_file", e))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, KvRecord>>> {
        self.data.read().map_err(|e| Error::operation("kv_read", e))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, KvRecord>>> {
        self.data.write().map_err(|e| Error::operation("kv_write", e))
    }
}

#[async_trait]
impl KvStorage for JsonKvStorage {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn all_keys(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<KvRecord>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Option<KvRecord>>> {
        let data = self.read()?;
        Ok(ids.iter().map(|id| data.get(id).cloned()).collect())
    }

    async fn filter_keys(&self, keys: &[String]) -> Result<BTreeSet<String>> {
        let data = self.read()?;
        Ok(keys
            .iter()
            .filter(|key| !data.contains_key(*key))
            .cloned()
            .collect())
    }

    async fn upsert(&self, data: BTreeMap<String, KvRecord>) -> Result<BTreeMap<String, KvRecord>> {
        let mut stored = self.write()?;
        let inserted: BTreeMap<String, KvRecord> = data
            .into_iter()
            .filter(|(key, _)| !stored.contains_key(key))
            .collect();
        for (key, record) in &inserted {
            stored.insert(key.clone(), record.clone());
        }
        drop(stored);

        tracing::debug!(namespace = %self.namespace, inserted = inserted.len(), "KV upsert");
        Ok(inserted)
    }

    async fn drop_all(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    async fn index_done(&self) -> Result<()> {
        let json = {
            let data = self.read()?;
            serde_json::to_string_pretty(&*data)
                .map_err(|e| Error::operation("serialize_kv_file", e))?
        };

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| Error::operation("write_kv_file", e))?;
        tracing::info!(namespace = %self.namespace, path = %self.path.display(), "KV store saved");
        Ok(())
    }
}
