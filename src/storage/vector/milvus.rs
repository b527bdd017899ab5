//! Milvus index client.
//!
//! Talks to the Milvus RESTful API (v2). Collections are created with the
//! quick-setup form: a `VarChar` primary key `id`, a float vector field
//! `vector`, and dynamic fields enabled so metadata keys need no schema.
//!
//! # Endpoints
//!
//! | Operation | Path |
//! |-----------|------|
//! | `has_collection` | `POST /v2/vectordb/collections/has` |
//! | `create_collection` | `POST /v2/vectordb/collections/create` |
//! | `upsert` | `POST /v2/vectordb/entities/upsert` |
//! | `search` | `POST /v2/vectordb/entities/search` |

use super::client::{
    CollectionSpec, IdKind, IndexRecord, SearchHit, SearchRequest, VectorIndexClient,
};
use crate::models::UpsertConfirmation;
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Search-time `nprobe` for IVF indexes; ignored by other index types.
const SEARCH_NPROBE: u32 = 10;

/// Milvus REST client.
///
/// Requests are stateless, so [`VectorIndexClient::release`] keeps the
/// default no-op; pooled connections close when the client drops.
pub struct MilvusClient {
    /// Base URI, e.g. `http://milvus:19530`.
    uri: String,
    /// Bearer token (`user:password` or API key).
    token: Option<SecretString>,
    /// Target database; `None` uses the server default.
    database: Option<String>,
    /// HTTP client.
    client: reqwest::Client,
}

impl MilvusClient {
    /// Default server URI.
    pub const DEFAULT_URI: &'static str = "http://milvus:19530";

    /// Creates a client for the given URI.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into().trim_end_matches('/').to_string(),
            token: None,
            database: None,
            client: reqwest::Client::new(),
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Returns the base URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn with_database_field(&self, mut body: Value) -> Value {
        if let (Some(db), Some(obj)) = (&self.database, body.as_object_mut()) {
            obj.insert("dbName".to_string(), Value::String(db.clone()));
        }
        body
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: Value,
    ) -> Result<Envelope<T>> {
        let mut request = self
            .client
            .post(format!("{}/v2/vectordb/{path}", self.uri))
            .json(&self.with_database_field(body));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::operation(operation, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: operation.to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::operation(operation, e))
    }

    /// Turns a search envelope into hits. Absent or null data means no hits.
    fn search_hits(envelope: Envelope<Vec<Map<String, Value>>>) -> Result<Vec<SearchHit>> {
        envelope
            .into_payload("milvus_search")?
            .unwrap_or_default()
            .into_iter()
            .map(Self::parse_hit)
            .collect()
    }

    fn create_body(spec: &CollectionSpec) -> Value {
        let IdKind::FixedLengthString { max_length } = spec.id_kind;
        json!({
            "collectionName": spec.name,
            "dimension": spec.dimension,
            "metricType": super::client::Metric::Cosine.as_str(),
            "idType": "VarChar",
            "autoId": false,
            "primaryFieldName": "id",
            "vectorFieldName": "vector",
            "params": { "max_length": max_length },
        })
    }

    fn upsert_body(collection: &str, records: Vec<IndexRecord>) -> Value {
        let data: Vec<Value> = records
            .into_iter()
            .map(|record| {
                let mut row = record.metadata;
                row.insert("id".to_string(), Value::String(record.id));
                row.insert("vector".to_string(), json!(record.vector));
                Value::Object(row)
            })
            .collect();
        json!({ "collectionName": collection, "data": data })
    }

    fn search_body(request: &SearchRequest<'_>) -> Value {
        json!({
            "collectionName": request.collection,
            "data": [request.vector],
            "annsField": "vector",
            "limit": request.limit,
            "outputFields": request.output_fields,
            "searchParams": {
                "metricType": request.metric.as_str(),
                "params": { "nprobe": SEARCH_NPROBE },
            },
        })
    }

    /// Splits a flat result row into id, distance and the remaining fields.
    fn parse_hit(mut row: Map<String, Value>) -> Result<SearchHit> {
        let id = match row.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Number(n)) => n.to_string(),
            other => {
                return Err(Error::OperationFailed {
                    operation: "milvus_search".to_string(),
                    cause: format!("hit has no usable id: {other:?}"),
                });
            },
        };
        #[allow(clippy::cast_possible_truncation)]
        let distance = row
            .remove("distance")
            .and_then(|d| d.as_f64())
            .ok_or_else(|| Error::operation("milvus_search", format!("hit '{id}' has no distance")))?
            as f32;
        row.remove("vector");

        Ok(SearchHit {
            id,
            distance,
            entity: row,
        })
    }
}

impl Default for MilvusClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URI)
    }
}

impl std::fmt::Debug for MilvusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MilvusClient")
            .field("uri", &self.uri)
            .field("database", &self.database)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VectorIndexClient for MilvusClient {
    async fn has_collection(&self, name: &str) -> Result<bool> {
        let data: HasData = self
            .post(
                "milvus_has_collection",
                "collections/has",
                json!({ "collectionName": name }),
            )
            .await?
            .into_data("milvus_has_collection")?;
        Ok(data.has)
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let _: Value = self
            .post(
                "milvus_create_collection",
                "collections/create",
                Self::create_body(spec),
            )
            .await?
            .into_data("milvus_create_collection")?;
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<IndexRecord>,
    ) -> Result<UpsertConfirmation> {
        let data: UpsertData = self
            .post(
                "milvus_upsert",
                "entities/upsert",
                Self::upsert_body(collection, records),
            )
            .await?
            .into_data("milvus_upsert")?;
        Ok(UpsertConfirmation {
            upsert_count: data.upsert_count,
            upsert_ids: data.upsert_ids.into_iter().map(id_to_string).collect(),
        })
    }

    async fn search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchHit>> {
        let envelope = self
            .post("milvus_search", "entities/search", Self::search_body(&request))
            .await?;
        let hits = Self::search_hits(envelope)?;
        tracing::debug!(collection = request.collection, hits = hits.len(), "Milvus search");
        Ok(hits)
    }
}

fn id_to_string(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Milvus REST response envelope: `{"code": 0, "data": ...}` on success,
/// `{"code": <n>, "message": ...}` on failure.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_payload(self, operation: &str) -> Result<Option<T>> {
        if self.code != 0 {
            return Err(Error::OperationFailed {
                operation: operation.to_string(),
                cause: format!(
                    "Milvus error {}: {}",
                    self.code,
                    self.message.unwrap_or_default()
                ),
            });
        }
        Ok(self.data)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    fn into_data(self, operation: &str) -> Result<T> {
        match self.into_payload(operation)? {
            Some(data) => Ok(data),
            // Create returns `data: {}` on some versions and no data on others.
            None => serde_json::from_value(Value::Object(Map::new()))
                .map_err(|e| Error::operation(operation, e)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HasData {
    has: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertData {
    #[serde(default)]
    upsert_count: usize,
    #[serde(default)]
    upsert_ids: Vec<Value>,
}
