//! Key-value storage backends.
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | [`JsonKvStorage`] | Default; one JSON file per namespace in the working directory |

mod json;

pub use json::JsonKvStorage;

// Re-export trait for convenience
pub use crate::storage::traits::{KvRecord, KvStorage};
