//! Deterministic hash-based embedder.
//!
//! Produces normalized pseudo-embeddings from word hashes. Texts sharing
//! words land near each other, but there is no semantic similarity: "cat"
//! and "feline" are unrelated. Useful for tests and offline pipelines.

// Allow cast precision loss for hash-based embedding calculations.
#![allow(clippy::cast_precision_loss)]
// Allow cast possible truncation for hash index calculations on 32-bit platforms.
#![allow(clippy::cast_possible_truncation)]

use super::{DEFAULT_DIMENSIONS, DEFAULT_MAX_BATCH_SIZE, Embedder};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Word limit per text to bound computation time.
const MAX_WORDS: usize = 1000;

/// Hash-based pseudo-embedder.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
    max_batch_size: usize,
}

impl HashEmbedder {
    /// Creates an embedder with [`DEFAULT_DIMENSIONS`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    /// Creates an embedder with custom dimensions (at least 1).
    #[must_use]
    pub const fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: if dimensions == 0 { 1 } else { dimensions },
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Sets the advisory maximum batch size.
    #[must_use]
    pub const fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Generates the pseudo-embedding for one text.
    fn pseudo_embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for (i, word) in text.split_whitespace().take(MAX_WORDS).enumerate() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            Self::distribute_hash(&mut embedding, hasher.finish(), i);
        }

        Self::normalize(&mut embedding);
        embedding
    }

    /// Spreads one word hash over eight dimensions.
    fn distribute_hash(embedding: &mut [f32], hash: u64, word_idx: usize) {
        let dimensions = embedding.len();
        for j in 0..8 {
            let idx = ((hash >> (j * 8)) as usize + word_idx) % dimensions;
            let value = ((hash >> (j * 4)) & 0xFF) as f32 / 255.0 - 0.5;
            embedding[idx] += value;
        }
    }

    fn normalize(embedding: &mut [f32]) {
        let norm_sq: f32 = embedding.iter().map(|x| x * x).sum();
        if norm_sq <= 0.0 {
            return;
        }
        let inv_norm = norm_sq.sqrt().recip();
        for v in embedding.iter_mut() {
            *v *= inv_norm;
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidInput("Cannot embed empty text".to_string()));
        }

        Ok(texts.iter().map(|t| self.pseudo_embed(t)).collect())
    }
}
