//! Embedding generation.
//!
//! The [`Embedder`] trait is the capability vector storages call to turn
//! text into fixed-dimension vectors. Implementations:
//!
//! | Embedder | Use Case |
//! |----------|----------|
//! | [`HashEmbedder`] | Deterministic pseudo-embeddings for tests and offline use |
//! | [`OpenAiEmbedder`] | OpenAI-compatible `/embeddings` HTTP endpoint |
//! | [`BulkheadEmbedder`] | Wraps any embedder with a concurrency limit |

mod bulkhead;
mod hash;
mod openai;

pub use bulkhead::{BulkheadEmbedder, EmbeddingBulkheadConfig};
pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Default embedding dimensions (all-MiniLM-L6-v2 sized vectors).
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Default advisory batch size for a single embedding call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Trait for embedding generators.
///
/// `embed_batch` must return exactly one vector per input text, in input
/// order, each of length [`dimensions()`](Embedder::dimensions).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Returns the largest batch this embedder wants in one call.
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Generates embeddings for multiple texts.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails or yields no vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::operation("embed", "no embedding returned"))
    }
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts).await
    }
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or 0.0 if the vectors differ in length,
/// are empty, or have zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
