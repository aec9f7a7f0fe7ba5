//! Vertex-indexed store of compressed adjacency lists
//!
//! Each vertex owns one [`AdjacencyBuffer`]. Every mutation decodes the affected
//! list, edits it, and re-encodes it whole: a single append can move the group
//! boundaries of everything after it, so bytes are never patched in place.
//!
//! ```text
//! vertex 0: [0xE4 FF 00 01 FF FF FF 00 00 00 01]  degree 4
//! vertex 1: []                                     degree 0
//! vertex 2: [0x00 01 02 03 04 | 0x00 05]           degree 5
//! ```

use super::adjacency::AdjacencyBuffer;
use crate::codec::VarIntGroupCodec;
use crate::config::GraphStoreConfig;
use crate::error::{GraphStoreError, Result};
use tracing::debug;

/// Vertex identifier (zero-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Compressed, mutable adjacency store
///
/// Optimized for:
/// - Small resident size (1-4 bytes per neighbour id)
/// - Point mutations during incremental graph build
/// - Sequential persistence without buffering the whole graph
///
/// # Example
///
/// ```
/// use trueno_graph_store::{GraphStore, NodeId};
///
/// let mut store = GraphStore::new(4, 8);
/// store.add_neighbour(NodeId(0), 1).unwrap();
/// store.add_neighbour(NodeId(0), 3).unwrap();
///
/// assert_eq!(store.get_neighbours(NodeId(0)).unwrap(), vec![1, 3]);
/// assert_eq!(store.get_max_observed_degree(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GraphStore {
    /// One buffer per vertex; the length is the vertex capacity
    buffers: Vec<AdjacencyBuffer>,

    /// Codec shared by every buffer
    codec: VarIntGroupCodec,

    /// Degree hint used to pre-size buffers at construction
    reserve_degree: usize,

    /// Largest degree seen across mutations and loads (high-water mark)
    max_observed_degree: u32,

    /// Largest raw record length seen while loading
    max_range_of_graph: usize,
}

impl GraphStore {
    /// Create a store of `total_points` empty vertices
    ///
    /// Each buffer reserves `2 * reserve_degree * 4` bytes so that incremental
    /// appends during build rarely reallocate.
    #[must_use]
    pub fn new(total_points: usize, reserve_degree: usize) -> Self {
        Self::with_config(&GraphStoreConfig::new(total_points).with_reserve_degree(reserve_degree))
    }

    /// Create a store from a [`GraphStoreConfig`]
    #[must_use]
    pub fn with_config(config: &GraphStoreConfig) -> Self {
        let bytes_per_buffer = 2 * config.reserve_degree * std::mem::size_of::<u32>();
        let buffers = (0..config.total_points)
            .map(|_| AdjacencyBuffer::with_capacity(bytes_per_buffer))
            .collect();

        Self {
            buffers,
            codec: config.codec(),
            reserve_degree: config.reserve_degree,
            max_observed_degree: 0,
            max_range_of_graph: 0,
        }
    }

    /// Neighbours of `vertex`, decoded into an owned snapshot
    ///
    /// # Errors
    ///
    /// Returns error if `vertex` is out of bounds
    pub fn get_neighbours(&self, vertex: NodeId) -> Result<Vec<u32>> {
        Ok(self.buffer(vertex)?.decode(self.codec))
    }

    /// Append `neighbour` to the end of `vertex`'s list
    ///
    /// Neighbour ids are raw `u32`s, as in [`set_neighbours`](Self::set_neighbours)
    /// and [`get_neighbours`](Self::get_neighbours); they are not bounds checked.
    ///
    /// # Errors
    ///
    /// Returns error if `vertex` is out of bounds
    pub fn add_neighbour(&mut self, vertex: NodeId, neighbour: u32) -> Result<()> {
        let codec = self.codec;
        let buffer = self.buffer_mut(vertex)?;

        let mut neighbours = buffer.decode(codec);
        neighbours.push(neighbour);
        buffer.encode(codec, &neighbours);

        let degree = buffer.degree();
        self.observe_degree(degree);
        Ok(())
    }

    /// Replace `vertex`'s list with `neighbours` (which may be empty)
    ///
    /// # Errors
    ///
    /// Returns error if `vertex` is out of bounds
    pub fn set_neighbours(&mut self, vertex: NodeId, neighbours: &[u32]) -> Result<()> {
        let codec = self.codec;
        let buffer = self.buffer_mut(vertex)?;
        buffer.encode(codec, neighbours);

        let degree = buffer.degree();
        self.observe_degree(degree);
        Ok(())
    }

    /// Remove every neighbour of `vertex`
    ///
    /// # Errors
    ///
    /// Returns error if `vertex` is out of bounds
    pub fn clear_neighbours(&mut self, vertex: NodeId) -> Result<()> {
        self.buffer_mut(vertex)?.clear();
        Ok(())
    }

    /// Exchange the lists of `a` and `b` without copying bytes
    ///
    /// # Errors
    ///
    /// Returns error if either vertex is out of bounds
    pub fn swap_neighbours(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        let a_idx = self.index(a)?;
        let b_idx = self.index(b)?;
        self.buffers.swap(a_idx, b_idx);
        Ok(())
    }

    /// Grow or truncate the vertex capacity, returning the new capacity
    ///
    /// New vertices start empty. Truncation discards trailing vertices.
    pub fn resize(&mut self, new_size: usize) -> usize {
        debug!(
            from = self.buffers.len(),
            to = new_size,
            "graph_store.resize"
        );
        self.buffers.resize_with(new_size, AdjacencyBuffer::default);
        self.buffers.len()
    }

    /// Drop every vertex and reset bookkeeping
    pub fn clear(&mut self) {
        self.buffers = Vec::new();
        self.max_observed_degree = 0;
        self.max_range_of_graph = 0;
    }

    /// Largest raw record length (bytes) seen while loading
    #[must_use]
    pub const fn get_max_range_of_graph(&self) -> usize {
        self.max_range_of_graph
    }

    /// Largest degree observed across mutations and loads
    #[must_use]
    pub const fn get_max_observed_degree(&self) -> u32 {
        self.max_observed_degree
    }

    /// Vertex capacity
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.buffers.len()
    }

    /// Degree hint the store was built with
    #[must_use]
    pub const fn reserve_degree(&self) -> usize {
        self.reserve_degree
    }

    /// Codec used for every adjacency list
    #[must_use]
    pub const fn codec(&self) -> VarIntGroupCodec {
        self.codec
    }

    /// Number of neighbours of `vertex`
    ///
    /// # Errors
    ///
    /// Returns error if `vertex` is out of bounds
    pub fn degree(&self, vertex: NodeId) -> Result<u32> {
        Ok(self.buffer(vertex)?.degree())
    }

    /// Encoded size of `vertex`'s list in bytes
    ///
    /// # Errors
    ///
    /// Returns error if `vertex` is out of bounds
    pub fn compressed_len(&self, vertex: NodeId) -> Result<usize> {
        Ok(self.buffer(vertex)?.byte_len())
    }

    /// Total number of stored edges
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.buffers.iter().map(|b| b.degree() as usize).sum()
    }

    /// Iterate over decoded adjacency lists (`vertex`, neighbours)
    pub fn iter_adjacency(&self) -> impl Iterator<Item = (NodeId, Vec<u32>)> + '_ {
        self.buffers.iter().enumerate().map(move |(idx, buffer)| {
            #[allow(clippy::cast_possible_truncation)] // Graphs >4B vertices not supported
            let vertex = NodeId(idx as u32);
            (vertex, buffer.decode(self.codec))
        })
    }

    pub(crate) fn buffers(&self) -> &[AdjacencyBuffer] {
        &self.buffers
    }

    /// Install a buffer read from disk, updating bookkeeping
    pub(crate) fn install_loaded(&mut self, idx: usize, buffer: AdjacencyBuffer) {
        self.max_range_of_graph = self.max_range_of_graph.max(buffer.byte_len());
        self.observe_degree(buffer.degree());
        self.buffers[idx] = buffer;
    }

    pub(crate) fn observe_degree(&mut self, degree: u32) {
        if degree > self.max_observed_degree {
            self.max_observed_degree = degree;
        }
    }

    fn index(&self, vertex: NodeId) -> Result<usize> {
        let idx = vertex.0 as usize;
        if idx >= self.buffers.len() {
            return Err(GraphStoreError::VertexOutOfBounds {
                vertex: vertex.0,
                capacity: self.buffers.len(),
            });
        }
        Ok(idx)
    }

    fn buffer(&self, vertex: NodeId) -> Result<&AdjacencyBuffer> {
        let idx = self.index(vertex)?;
        Ok(&self.buffers[idx])
    }

    fn buffer_mut(&mut self, vertex: NodeId) -> Result<&mut AdjacencyBuffer> {
        let idx = self.index(vertex)?;
        Ok(&mut self.buffers[idx])
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::with_config(&GraphStoreConfig::default())
    }
}
