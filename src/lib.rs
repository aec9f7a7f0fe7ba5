//! trueno-graph-store: compressed adjacency storage for ANN graph indexes
//!
//! # Overview
//!
//! trueno-graph-store keeps the neighbour lists of an approximate-nearest-neighbour
//! graph (Vamana/DiskANN style) in group-varint compressed form, supports point
//! mutations during index build, and persists the graph to a compact binary file.
//!
//! # Quick Start
//!
//! ```no_run
//! use trueno_graph_store::{GraphStore, NodeId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // One buffer per vertex, pre-sized for ~32 neighbours each
//! let mut store = GraphStore::new(1_000, 32);
//! store.add_neighbour(NodeId(0), 17)?;
//! store.set_neighbours(NodeId(1), &[0, 17, 512])?;
//!
//! // Decoded snapshot, independent of later mutations
//! let neighbours = store.get_neighbours(NodeId(1))?;
//! assert_eq!(neighbours, vec![0, 17, 512]);
//!
//! // Persist: 24-byte header + one length-prefixed record per vertex
//! store.store("graph.bin", store.total_points(), 0, 0)?;
//!
//! let mut loaded = GraphStore::new(1_000, 32);
//! let summary = loaded.load("graph.bin", 1_000)?;
//! assert_eq!(summary.nodes_read, 1_000);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Codec**: group varint, optional delta coding ([`VarIntGroupCodec`])
//! - **Storage**: one [`AdjacencyBuffer`] per vertex, degree tracked alongside bytes
//! - **Persistence**: streamed binary format with a rewritten header
//! - **Export**: Parquet edge lists (`storage` feature)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod error;
pub mod storage;

// Re-export core types
pub use codec::VarIntGroupCodec;
pub use config::{GraphStoreConfig, DEFAULT_RESERVE_DEGREE};
pub use error::{GraphStoreError, IoOperation, Result};
pub use storage::{AdjacencyBuffer, GraphHeader, GraphStore, LoadSummary, NodeId};
