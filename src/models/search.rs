//! Query hits and upsert confirmations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single ranked match returned by a vector query.
///
/// Serializes flat: `{"id": ..., "distance": ..., <metadata fields>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    /// Document key.
    pub id: String,
    /// Backend score for the match (cosine similarity for cosine indexes).
    pub distance: f32,
    /// Projected metadata fields.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl QueryHit {
    /// Returns a metadata field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.metadata.get(field)
    }
}

/// Ranked query hits, best match first.
pub type QueryResult = Vec<QueryHit>;

/// Backend confirmation of a bulk upsert.
///
/// The default value is the empty confirmation returned when there was
/// nothing to write; it serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertConfirmation {
    /// Number of records the backend accepted.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub upsert_count: usize,
    /// Keys of the records the backend accepted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upsert_ids: Vec<String>,
}

impl UpsertConfirmation {
    /// Creates a confirmation for the given ids.
    #[must_use]
    pub fn for_ids(upsert_ids: Vec<String>) -> Self {
        Self {
            upsert_count: upsert_ids.len(),
            upsert_ids,
        }
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.upsert_count == 0 && self.upsert_ids.is_empty()
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(n: &usize) -> bool {
    *n == 0
}
