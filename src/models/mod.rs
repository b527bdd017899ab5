//! Data models for ragstore.
//!
//! Documents flow in through upsert, query hits flow out through query.

mod document;
mod meta;
mod search;

pub use document::{CONTENT_FIELD, Document, DocumentBatch};
pub use meta::{MetaFieldSet, RESERVED_FIELDS};
pub use search::{QueryHit, QueryResult, UpsertConfirmation};
