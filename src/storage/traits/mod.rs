//! Storage backend traits.

mod graph;
mod kv;
mod vector;

pub use graph::{GraphAttributes, GraphStorage};
pub use kv::{KvRecord, KvStorage};
pub use vector::VectorStorage;
