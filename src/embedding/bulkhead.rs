//! Bulkhead pattern for embedding operations.
//!
//! A single upsert fans out one embedding call per batch, all at once. Remote
//! embedding APIs rate-limit and local models saturate CPU, so the bulkhead
//! caps how many of those calls are in flight with a semaphore.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ragstore::embedding::{BulkheadEmbedder, EmbeddingBulkheadConfig, OpenAiEmbedder};
//!
//! let embedder = BulkheadEmbedder::new(
//!     OpenAiEmbedder::new(),
//!     EmbeddingBulkheadConfig::default().with_max_concurrent(8),
//! );
//! ```

use super::Embedder;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Configuration for the embedding bulkhead.
#[derive(Debug, Clone)]
pub struct EmbeddingBulkheadConfig {
    /// Maximum concurrent embedding calls.
    ///
    /// Default: 4.
    pub max_concurrent: usize,

    /// Timeout for acquiring a permit in milliseconds (0 = wait forever).
    ///
    /// Default: 60000ms.
    pub acquire_timeout_ms: u64,

    /// Whether to fail immediately when the bulkhead is full.
    ///
    /// Default: false (wait for a permit).
    pub fail_fast: bool,
}

impl Default for EmbeddingBulkheadConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingBulkheadConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_concurrent: 4,
            acquire_timeout_ms: 60_000,
            fail_fast: false,
        }
    }

    /// Sets the maximum concurrent calls.
    #[must_use]
    pub const fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Sets the acquire timeout in milliseconds.
    #[must_use]
    pub const fn with_acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }

    /// Sets whether to fail fast when the bulkhead is full.
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Embedder wrapper limiting concurrent calls to the inner embedder.
pub struct BulkheadEmbedder<E: Embedder> {
    inner: E,
    config: EmbeddingBulkheadConfig,
    semaphore: Arc<Semaphore>,
}

impl<E: Embedder> BulkheadEmbedder<E> {
    /// Creates a new bulkhead-wrapped embedder.
    #[must_use]
    pub fn new(inner: E, config: EmbeddingBulkheadConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            inner,
            config,
            semaphore,
        }
    }

    /// Returns the number of available permits.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Returns the wrapped embedder.
    pub const fn inner(&self) -> &E {
        &self.inner
    }

    #[allow(clippy::cast_precision_loss)]
    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        metrics::gauge!("embedding_bulkhead_available_permits")
            .set(self.semaphore.available_permits() as f64);

        if self.config.fail_fast {
            return Arc::clone(&self.semaphore)
                .try_acquire_owned()
                .map_err(|_| {
                    metrics::counter!("embedding_bulkhead_rejections_total", "reason" => "full")
                        .increment(1);
                    Error::OperationFailed {
                        operation: "embedding_bulkhead_acquire".to_string(),
                        cause: format!(
                            "Embedding bulkhead full (max: {})",
                            self.config.max_concurrent
                        ),
                    }
                });
        }

        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        let permit = if self.config.acquire_timeout_ms == 0 {
            acquire.await
        } else {
            let timeout = Duration::from_millis(self.config.acquire_timeout_ms);
            tokio::time::timeout(timeout, acquire).await.map_err(|_| {
                metrics::counter!("embedding_bulkhead_rejections_total", "reason" => "timeout")
                    .increment(1);
                Error::OperationFailed {
                    operation: "embedding_bulkhead_acquire".to_string(),
                    cause: format!(
                        "Embedding bulkhead acquire timed out after {}ms",
                        timeout.as_millis()
                    ),
                }
            })?
        };

        permit.map_err(|e| Error::operation("embedding_bulkhead_acquire", e))
    }
}

#[async_trait]
impl<E: Embedder> Embedder for BulkheadEmbedder<E> {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let _permit = self.acquire_permit().await?;
        metrics::counter!("embedding_bulkhead_permits_acquired_total").increment(1);
        tracing::trace!(batch_size = texts.len(), "Acquired embedding bulkhead permit");

        let result = self.inner.embed_batch(texts).await;

        tracing::trace!(success = result.is_ok(), "Released embedding bulkhead permit");
        result
    }
}
