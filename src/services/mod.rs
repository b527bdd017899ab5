//! Storage wiring services.
//!
//! Services build storage backends from configuration and hand them out as
//! trait objects.

mod backend_factory;

pub use backend_factory::{BackendFactory, GRAPH_NAMESPACE, KV_NAMESPACES, VECTOR_NAMESPACES};
pub use crate::storage::StorageSet;
