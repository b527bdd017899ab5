//! Embedding-backed vector storage over any index client.
//!
//! [`IndexedVectorStorage`] is the one [`VectorStorage`] implementation; the
//! backend varies through its [`VectorIndexClient`] and the embedding model
//! through its [`Embedder`].
//!
//! # Upsert Pipeline
//!
//! | Step | Behavior |
//! |------|----------|
//! | Filter | Documents without string `content` are skipped and logged |
//! | Project | Each record keeps only the declared metadata fields |
//! | Partition | Contents are cut into batches of the effective batch size |
//! | Embed | All batches are embedded concurrently; first failure aborts |
//! | Reassemble | Vectors are reattached in document order |
//! | Write | One bulk upsert to the index |

use super::batching::{effective_batch_size, partition, reassemble};
use super::client::{self, IndexRecord, Metric, SearchRequest, VectorIndexClient};
use crate::config::VectorStorageConfig;
use crate::embedding::Embedder;
use crate::models::{DocumentBatch, MetaFieldSet, QueryHit, UpsertConfirmation};
use crate::storage::traits::VectorStorage;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::instrument;

/// Vector storage for one namespace, backed by an index client and an embedder.
pub struct IndexedVectorStorage<C, E> {
    client: C,
    embedder: E,
    namespace: String,
    meta_fields: MetaFieldSet,
    output_fields: Vec<String>,
    batch_size: usize,
    default_top_k: usize,
}

/// Documents ready for embedding, in key order.
struct Prepared {
    records: Vec<IndexRecord>,
    contents: Vec<String>,
    skipped: usize,
}

impl<C, E> IndexedVectorStorage<C, E>
where
    C: VectorIndexClient,
    E: Embedder,
{
    /// Creates a storage without touching the backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the namespace is empty or a
    /// metadata field name is reserved.
    pub fn new(client: C, embedder: E, config: VectorStorageConfig) -> Result<Self> {
        let meta_fields = config.meta_field_set()?;
        let batch_size = effective_batch_size(config.max_batch_size, embedder.max_batch_size());
        Ok(Self {
            client,
            embedder,
            output_fields: meta_fields.to_vec(),
            meta_fields,
            namespace: config.namespace,
            batch_size,
            default_top_k: config.default_top_k,
        })
    }

    /// Creates a storage and ensures its collection exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the collection
    /// cannot be checked or created.
    pub async fn connect(client: C, embedder: E, config: VectorStorageConfig) -> Result<Self> {
        let storage = Self::new(client, embedder, config)?;
        VectorStorage::ensure_collection(&storage).await?;
        Ok(storage)
    }

    /// Returns the number of texts sent per embedding call.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the index client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns the embedder.
    #[must_use]
    pub const fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns the declared metadata fields.
    #[must_use]
    pub const fn meta_fields(&self) -> &MetaFieldSet {
        &self.meta_fields
    }

    fn prepare(&self, documents: DocumentBatch) -> Prepared {
        let mut prepared = Prepared {
            records: Vec::with_capacity(documents.len()),
            contents: Vec::with_capacity(documents.len()),
            skipped: 0,
        };

        for (id, document) in documents {
            let Some(content) = document.content() else {
                tracing::warn!(
                    namespace = %self.namespace,
                    id = %id,
                    "Skipping document without string content"
                );
                prepared.skipped += 1;
                continue;
            };
            prepared.contents.push(content.to_string());
            prepared.records.push(IndexRecord {
                metadata: document.project(&self.meta_fields),
                id,
                vector: Vec::new(),
            });
        }

        prepared
    }

    /// Embeds `contents` in concurrent batches, returning vectors in input order.
    async fn embed_contents(&self, contents: &[String]) -> Result<Vec<Vec<f32>>> {
        let batches: Vec<&[String]> = partition(contents, self.batch_size).collect();
        let expected: Vec<usize> = batches.iter().map(|batch| batch.len()).collect();

        tracing::debug!(
            namespace = %self.namespace,
            texts = contents.len(),
            batches = batches.len(),
            batch_size = self.batch_size,
            "Embedding batches"
        );

        let outputs = try_join_all(
            batches
                .into_iter()
                .map(|batch| self.embedder.embed_batch(batch)),
        )
        .await?;

        metrics::counter!(
            "vector_embedding_batches_total",
            "namespace" => self.namespace.clone()
        )
        .increment(expected.len() as u64);

        reassemble(&expected, outputs)
    }

    fn project_entity(&self, entity: Map<String, Value>) -> Map<String, Value> {
        entity
            .into_iter()
            .filter(|(key, _)| self.meta_fields.contains(key))
            .collect()
    }

    fn record_query(&self, status: &'static str, start: Instant) {
        metrics::counter!(
            "vector_query_total",
            "namespace" => self.namespace.clone(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "vector_query_duration_ms",
            "namespace" => self.namespace.clone()
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);
    }
}

#[async_trait]
impl<C, E> VectorStorage for IndexedVectorStorage<C, E>
where
    C: VectorIndexClient,
    E: Embedder,
{
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    async fn ensure_collection(&self) -> Result<()> {
        client::ensure_collection(&self.client, &self.namespace, self.embedder.dimensions())
            .await
            .map(|_| ())
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!(namespace = %self.namespace, "Releasing index client");
        self.client.release().await
    }

    #[instrument(
        name = "ragstore.vector.upsert",
        skip(self, documents),
        fields(namespace = %self.namespace, documents = documents.len())
    )]
    async fn upsert(&self, documents: DocumentBatch) -> Result<UpsertConfirmation> {
        if documents.is_empty() {
            tracing::debug!("Nothing to upsert");
            return Ok(UpsertConfirmation::default());
        }

        let Prepared {
            mut records,
            contents,
            skipped,
        } = self.prepare(documents);

        if skipped > 0 {
            metrics::counter!(
                "vector_upsert_skipped_total",
                "namespace" => self.namespace.clone()
            )
            .increment(skipped as u64);
        }
        if records.is_empty() {
            tracing::debug!(skipped, "No indexable documents");
            return Ok(UpsertConfirmation::default());
        }

        let vectors = self.embed_contents(&contents).await.inspect_err(|e| {
            tracing::error!(error = %e, "Embedding failed; nothing written");
        })?;
        for (record, vector) in records.iter_mut().zip(vectors) {
            record.vector = vector;
        }

        let count = records.len();
        let confirmation = self
            .client
            .upsert(&self.namespace, records)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, "Index upsert failed");
            })?;

        metrics::counter!(
            "vector_upsert_documents_total",
            "namespace" => self.namespace.clone()
        )
        .increment(count as u64);
        tracing::info!(written = count, skipped, "Upserted documents");

        Ok(confirmation)
    }

    #[instrument(
        name = "ragstore.vector.query",
        skip(self, text),
        fields(namespace = %self.namespace, top_k)
    )]
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let start = Instant::now();

        let result = async {
            let output = self.embedder.embed_batch(&[text.to_string()]).await?;
            let vector = reassemble(&[1], vec![output])?
                .pop()
                .ok_or_else(|| Error::operation("vector_query", "no query embedding"))?;

            self.client
                .search(SearchRequest {
                    collection: &self.namespace,
                    vector: &vector,
                    limit: top_k,
                    output_fields: &self.output_fields,
                    metric: Metric::Cosine,
                })
                .await
        }
        .await;

        let status = if result.is_ok() { "success" } else { "error" };
        self.record_query(status, start);

        let hits = result.inspect_err(|e| {
            tracing::error!(error = %e, "Vector query failed");
        })?;

        metrics::histogram!(
            "vector_query_hits",
            "namespace" => self.namespace.clone()
        )
        .record(hits.len() as f64);

        Ok(hits
            .into_iter()
            .map(|hit| QueryHit {
                metadata: self.project_entity(hit.entity),
                id: hit.id,
                distance: hit.distance,
            })
            .collect())
    }
}

impl<C, E> std::fmt::Debug for IndexedVectorStorage<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedVectorStorage")
            .field("namespace", &self.namespace)
            .field("meta_fields", &self.output_fields)
            .field("batch_size", &self.batch_size)
            .field("default_top_k", &self.default_top_k)
            .finish_non_exhaustive()
    }
}
