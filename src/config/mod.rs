//! Configuration management.
//!
//! Configuration comes from a TOML file, then `RAGSTORE_*` environment
//! variables override individual values.
//!
//! ```toml
//! [vector]
//! backend = "milvus"
//! max_batch_size = 64
//! default_top_k = 10
//! meta_fields = ["entity_name"]
//!
//! [milvus]
//! uri = "http://localhost:19530"
//!
//! [embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//! dimensions = 1536
//! max_concurrent = 8
//! fail_fast = true
//!
//! [kv]
//! working_dir = "./rag_storage"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

mod vector;

pub use vector::{DEFAULT_TOP_K, VectorStorageConfig};

use crate::embedding::{DEFAULT_DIMENSIONS, DEFAULT_MAX_BATCH_SIZE, EmbeddingBulkheadConfig};
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for ragstore.
#[derive(Debug, Clone)]
pub struct RagstoreConfig {
    /// Vector storage settings shared by all namespaces.
    pub vector: VectorSettings,
    /// Milvus connection settings.
    pub milvus: MilvusSettings,
    /// Embedding provider settings.
    pub embedding: EmbeddingSettings,
    /// Key-value storage settings.
    pub kv: KvSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Available vector index backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorBackendKind {
    /// Brute-force in-process index.
    #[default]
    Memory,
    /// Milvus via its REST API.
    Milvus,
}

impl VectorBackendKind {
    /// Parses a backend name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureNotEnabled`] for unknown backends.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(Self::Memory),
            "milvus" => Ok(Self::Milvus),
            other => Err(Error::FeatureNotEnabled(format!(
                "vector backend '{other}'"
            ))),
        }
    }

    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Milvus => "milvus",
        }
    }
}

/// Available embedding providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingProvider {
    /// Deterministic hash embeddings.
    #[default]
    Hash,
    /// `OpenAI`-compatible HTTP endpoint.
    OpenAi,
}

impl EmbeddingProvider {
    /// Parses a provider name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureNotEnabled`] for unknown providers.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "openai" | "open_ai" | "open-ai" => Ok(Self::OpenAi),
            other => Err(Error::FeatureNotEnabled(format!(
                "embedding provider '{other}'"
            ))),
        }
    }
}

/// Vector storage settings.
#[derive(Debug, Clone)]
pub struct VectorSettings {
    /// Index backend.
    pub backend: VectorBackendKind,
    /// Maximum texts per embedding call.
    pub max_batch_size: usize,
    /// Hit count for default queries.
    pub default_top_k: usize,
    /// Metadata fields persisted for every namespace.
    pub meta_fields: Vec<String>,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            backend: VectorBackendKind::default(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            default_top_k: DEFAULT_TOP_K,
            meta_fields: Vec::new(),
        }
    }
}

/// Milvus connection settings.
#[derive(Debug, Clone)]
pub struct MilvusSettings {
    /// Server URI.
    pub uri: String,
    /// Bearer token (`user:password` or API key).
    pub token: Option<SecretString>,
}

impl Default for MilvusSettings {
    fn default() -> Self {
        Self {
            uri: "http://milvus:19530".to_string(),
            token: None,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    /// Provider.
    pub provider: EmbeddingProvider,
    /// Model name.
    pub model: Option<String>,
    /// Endpoint base URL.
    pub base_url: Option<String>,
    /// API key.
    pub api_key: Option<SecretString>,
    /// Vector dimensions.
    pub dimensions: usize,
    /// Advisory batch size for the provider.
    pub max_batch_size: usize,
    /// Maximum concurrent embedding calls (bulkhead).
    pub max_concurrent: usize,
    /// Bulkhead permit timeout in milliseconds.
    pub acquire_timeout_ms: u64,
    /// Reject calls instead of waiting when the bulkhead is full.
    pub fail_fast: bool,
}

impl EmbeddingSettings {
    /// Bulkhead configuration derived from these settings.
    #[must_use]
    pub const fn bulkhead(&self) -> EmbeddingBulkheadConfig {
        EmbeddingBulkheadConfig::new()
            .with_max_concurrent(self.max_concurrent)
            .with_acquire_timeout_ms(self.acquire_timeout_ms)
            .with_fail_fast(self.fail_fast)
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: None,
            base_url: None,
            api_key: None,
            dimensions: DEFAULT_DIMENSIONS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_concurrent: 4,
            acquire_timeout_ms: 60_000,
            fail_fast: false,
        }
    }
}

/// Key-value storage settings.
#[derive(Debug, Clone)]
pub struct KvSettings {
    /// Directory holding `kv_store_{namespace}.json` files.
    pub working_dir: PathBuf,
}

impl Default for KvSettings {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("./rag_storage"),
        }
    }
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive (`info`, `ragstore=debug`, ...).
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Vector section.
    pub vector: Option<ConfigFileVector>,
    /// Milvus section.
    pub milvus: Option<ConfigFileMilvus>,
    /// Embedding section.
    pub embedding: Option<ConfigFileEmbedding>,
    /// KV section.
    pub kv: Option<ConfigFileKv>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Vector section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileVector {
    /// Backend name.
    pub backend: Option<String>,
    /// Max batch size.
    pub max_batch_size: Option<usize>,
    /// Default top-k.
    pub default_top_k: Option<usize>,
    /// Metadata fields.
    pub meta_fields: Option<Vec<String>>,
}

/// Milvus section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMilvus {
    /// Server URI.
    pub uri: Option<String>,
    /// Token.
    pub token: Option<String>,
}

/// Embedding section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileEmbedding {
    /// Provider name.
    pub provider: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Dimensions.
    pub dimensions: Option<usize>,
    /// Provider batch size.
    pub max_batch_size: Option<usize>,
    /// Max concurrent calls.
    pub max_concurrent: Option<usize>,
    /// Permit timeout.
    pub acquire_timeout_ms: Option<u64>,
    /// Fail when the bulkhead is full.
    pub fail_fast: Option<bool>,
}

/// KV section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileKv {
    /// Working directory.
    pub working_dir: Option<String>,
}

impl Default for RagstoreConfig {
    fn default() -> Self {
        Self {
            vector: VectorSettings::default(),
            milvus: MilvusSettings::default(),
            embedding: EmbeddingSettings::default(),
            kv: KvSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl RagstoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path, then applies env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or names an
    /// unknown backend or provider.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)?.with_env_overrides()
    }

    /// Parses configuration from TOML text (no env overrides).
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Looks for `ragstore/config.toml` under the platform config dir, then
    /// `~/.config/ragstore/config.toml`. Falls back to defaults with env
    /// overrides when neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but is invalid.
    pub fn load_default() -> Result<Self> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default().with_env_overrides();
        };

        let candidates = [
            base_dirs.config_dir().join("ragstore").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("ragstore")
                .join("config.toml"),
        ];

        match candidates.iter().find(|path| path.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading ragstore config");
                Self::load_from_file(path)
            },
            None => Self::default().with_env_overrides(),
        }
    }

    /// Converts a `ConfigFile` to `RagstoreConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(vector) = file.vector {
            if let Some(backend) = vector.backend {
                config.vector.backend = VectorBackendKind::parse(&backend)?;
            }
            if let Some(v) = vector.max_batch_size {
                config.vector.max_batch_size = v;
            }
            if let Some(v) = vector.default_top_k {
                config.vector.default_top_k = v;
            }
            if let Some(v) = vector.meta_fields {
                config.vector.meta_fields = v;
            }
        }
        if let Some(milvus) = file.milvus {
            if let Some(uri) = milvus.uri {
                config.milvus.uri = uri;
            }
            config.milvus.token = milvus.token.map(SecretString::from);
        }
        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                config.embedding.provider = EmbeddingProvider::parse(&provider)?;
            }
            config.embedding.model = embedding.model;
            config.embedding.base_url = embedding.base_url;
            config.embedding.api_key = embedding.api_key.map(SecretString::from);
            if let Some(v) = embedding.dimensions {
                config.embedding.dimensions = v;
            }
            if let Some(v) = embedding.max_batch_size {
                config.embedding.max_batch_size = v;
            }
            if let Some(v) = embedding.max_concurrent {
                config.embedding.max_concurrent = v;
            }
            if let Some(v) = embedding.acquire_timeout_ms {
                config.embedding.acquire_timeout_ms = v;
            }
            if let Some(v) = embedding.fail_fast {
                config.embedding.fail_fast = v;
            }
        }
        if let Some(kv) = file.kv
            && let Some(dir) = kv.working_dir
        {
            config.kv.working_dir = PathBuf::from(dir);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Applies `RAGSTORE_*` environment variable overrides.
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `RAGSTORE_VECTOR_BACKEND` | `vector.backend` |
    /// | `RAGSTORE_MAX_BATCH_SIZE` | `vector.max_batch_size` |
    /// | `RAGSTORE_MILVUS_URI` | `milvus.uri` |
    /// | `RAGSTORE_MILVUS_TOKEN` | `milvus.token` |
    /// | `RAGSTORE_EMBEDDING_PROVIDER` | `embedding.provider` |
    /// | `RAGSTORE_EMBEDDING_MODEL` | `embedding.model` |
    /// | `RAGSTORE_EMBEDDING_BASE_URL` | `embedding.base_url` |
    /// | `RAGSTORE_EMBEDDING_DIMENSIONS` | `embedding.dimensions` |
    /// | `RAGSTORE_EMBEDDING_MAX_CONCURRENT` | `embedding.max_concurrent` |
    /// | `RAGSTORE_EMBEDDING_ACQUIRE_TIMEOUT_MS` | `embedding.acquire_timeout_ms` |
    /// | `RAGSTORE_EMBEDDING_FAIL_FAST` | `embedding.fail_fast` |
    /// | `RAGSTORE_WORKING_DIR` | `kv.working_dir` |
    ///
    /// # Errors
    ///
    /// Returns an error if an override names an unknown backend or provider.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("RAGSTORE_VECTOR_BACKEND") {
            self.vector.backend = VectorBackendKind::parse(&v)?;
        }
        if let Some(v) = lookup("RAGSTORE_MAX_BATCH_SIZE")
            && let Ok(parsed) = v.parse::<usize>()
        {
            self.vector.max_batch_size = parsed.max(1);
        }
        if let Some(v) = lookup("RAGSTORE_MILVUS_URI") {
            self.milvus.uri = v;
        }
        if let Some(v) = lookup("RAGSTORE_MILVUS_TOKEN") {
            self.milvus.token = Some(SecretString::from(v));
        }
        if let Some(v) = lookup("RAGSTORE_EMBEDDING_PROVIDER") {
            self.embedding.provider = EmbeddingProvider::parse(&v)?;
        }
        if let Some(v) = lookup("RAGSTORE_EMBEDDING_MODEL") {
            self.embedding.model = Some(v);
        }
        if let Some(v) = lookup("RAGSTORE_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
        if let Some(v) = lookup("RAGSTORE_EMBEDDING_DIMENSIONS")
            && let Ok(parsed) = v.parse::<usize>()
        {
            self.embedding.dimensions = parsed;
        }
        if let Some(v) = lookup("RAGSTORE_EMBEDDING_MAX_CONCURRENT")
            && let Ok(parsed) = v.parse::<usize>()
        {
            self.embedding.max_concurrent = parsed.max(1);
        }
        if let Some(v) = lookup("RAGSTORE_EMBEDDING_ACQUIRE_TIMEOUT_MS")
            && let Ok(parsed) = v.parse::<u64>()
        {
            self.embedding.acquire_timeout_ms = parsed;
        }
        if let Some(v) = lookup("RAGSTORE_EMBEDDING_FAIL_FAST") {
            self.embedding.fail_fast = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Some(v) = lookup("RAGSTORE_WORKING_DIR") {
            self.kv.working_dir = PathBuf::from(v);
        }
        Ok(self)
    }

    /// Builds the storage configuration for one vector namespace.
    #[must_use]
    pub fn vector_storage(&self, namespace: impl Into<String>) -> VectorStorageConfig {
        VectorStorageConfig::new(namespace)
            .with_meta_fields(self.vector.meta_fields.iter().cloned())
            .with_max_batch_size(self.vector.max_batch_size)
            .with_default_top_k(self.vector.default_top_k)
    }

    /// Sets the KV working directory.
    #[must_use]
    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.kv.working_dir = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RagstoreConfig::default();
        assert_eq!(config.vector.backend, VectorBackendKind::Memory);
        assert_eq!(config.vector.max_batch_size, 100);
        assert_eq!(config.milvus.uri, "http://milvus:19530");
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hash);
        assert_eq!(config.kv.working_dir, PathBuf::from("./rag_storage"));
    }

    #[test]
    fn test_from_toml() {
        let config = RagstoreConfig::from_toml(
            r#"
            [vector]
            backend = "milvus"
            max_batch_size = 16
            meta_fields = ["entity_name", "source_id"]

            [milvus]
            uri = "http://localhost:19530"
            token = "root:Milvus"

            [embedding]
            provider = "openai"
            model = "text-embedding-3-large"
            dimensions = 3072

            [kv]
            working_dir = "/tmp/rag"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.vector.backend, VectorBackendKind::Milvus);
        assert_eq!(config.vector.max_batch_size, 16);
        assert_eq!(config.vector.meta_fields, vec!["entity_name", "source_id"]);
        assert_eq!(config.milvus.uri, "http://localhost:19530");
        assert_eq!(
            config.milvus.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("root:Milvus".to_string())
        );
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(config.embedding.dimensions, 3072);
        assert_eq!(config.kv.working_dir, PathBuf::from("/tmp/rag"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = RagstoreConfig::from_toml("[vector]\nbackend = \"faiss\"\n");
        assert!(matches!(result, Err(Error::FeatureNotEnabled(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RAGSTORE_VECTOR_BACKEND", "milvus"),
            ("RAGSTORE_MAX_BATCH_SIZE", "0"),
            ("RAGSTORE_MILVUS_URI", "http://db:19530"),
            ("RAGSTORE_EMBEDDING_DIMENSIONS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = RagstoreConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.vector.backend, VectorBackendKind::Milvus);
        assert_eq!(config.vector.max_batch_size, 1);
        assert_eq!(config.milvus.uri, "http://db:19530");
        assert_eq!(config.embedding.dimensions, DEFAULT_DIMENSIONS);
    }

    #[test]
    fn test_bulkhead_settings_from_file_and_env() {
        let config = RagstoreConfig::from_toml(
            "[embedding]\nmax_concurrent = 2\nacquire_timeout_ms = 500\n",
        )
        .unwrap();
        let bulkhead = config.embedding.bulkhead();
        assert_eq!(bulkhead.max_concurrent, 2);
        assert_eq!(bulkhead.acquire_timeout_ms, 500);
        assert!(!bulkhead.fail_fast);

        let vars: HashMap<&str, &str> = [
            ("RAGSTORE_EMBEDDING_MAX_CONCURRENT", "0"),
            ("RAGSTORE_EMBEDDING_ACQUIRE_TIMEOUT_MS", "250"),
            ("RAGSTORE_EMBEDDING_FAIL_FAST", "TRUE"),
        ]
        .into_iter()
        .collect();
        let config = config
            .with_overrides(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();

        let bulkhead = config.embedding.bulkhead();
        assert_eq!(bulkhead.max_concurrent, 1);
        assert_eq!(bulkhead.acquire_timeout_ms, 250);
        assert!(bulkhead.fail_fast);
    }

    #[test]
    fn test_fail_fast_from_toml() {
        let config = RagstoreConfig::from_toml("[embedding]\nfail_fast = true\n").unwrap();
        assert!(config.embedding.fail_fast);
    }

    #[test]
    fn test_vector_storage_config() {
        let mut config = RagstoreConfig::default();
        config.vector.meta_fields = vec!["entity_name".to_string()];
        config.vector.max_batch_size = 32;

        let storage = config.vector_storage("entities");
        assert_eq!(storage.namespace, "entities");
        assert_eq!(storage.meta_fields, vec!["entity_name"]);
        assert_eq!(storage.max_batch_size, 32);
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = RagstoreConfig::load_from_file(Path::new("/nonexistent/ragstore.toml"));
        assert!(result.is_err());
    }
}
