//! Graph storage layer
//!
//! Provides per-vertex compressed adjacency buffers, the vertex-indexed store, its
//! binary persistence, and optional Parquet export.

pub mod adjacency;
pub mod graph_store;
pub mod persist;

#[cfg(feature = "storage")]
pub mod parquet;

pub use adjacency::AdjacencyBuffer;
pub use graph_store::{GraphStore, NodeId};
pub use persist::{GraphHeader, LoadSummary};
