//! Per-vertex compressed adjacency buffer

use crate::codec::VarIntGroupCodec;

/// Compressed neighbour list of one vertex
///
/// `degree` is the number of values encoded in `compressed`. It cannot be derived
/// from the byte length, so both fields are only ever written together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyBuffer {
    compressed: Vec<u8>,
    degree: u32,
}

impl AdjacencyBuffer {
    /// Empty buffer with `capacity` bytes reserved
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            compressed: Vec::with_capacity(capacity),
            degree: 0,
        }
    }

    /// Buffer adopting already-encoded bytes
    #[must_use]
    pub fn from_raw(compressed: Vec<u8>, degree: u32) -> Self {
        Self { compressed, degree }
    }

    /// Number of neighbours
    #[must_use]
    pub const fn degree(&self) -> u32 {
        self.degree
    }

    /// Encoded bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.compressed
    }

    /// Encoded length in bytes
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.compressed.len()
    }

    /// Bytes allocated for the encoded list
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.compressed.capacity()
    }

    /// True if the vertex has no neighbours
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.degree == 0
    }

    /// Decode the neighbour list into an owned `Vec`
    #[must_use]
    pub fn decode(&self, codec: VarIntGroupCodec) -> Vec<u32> {
        if self.degree == 0 {
            return Vec::new();
        }

        let (neighbours, consumed) = codec.decode_to_vec(&self.compressed, self.degree as usize);
        debug_assert_eq!(consumed, self.compressed.len());
        neighbours
    }

    /// Replace the contents with the encoding of `neighbours`
    ///
    /// Reuses the existing allocation when it is large enough.
    pub fn encode(&mut self, codec: VarIntGroupCodec, neighbours: &[u32]) {
        self.compressed.clear();
        self.compressed
            .resize(VarIntGroupCodec::max_compressed_len(neighbours.len()), 0);
        let written = codec.encode(neighbours, &mut self.compressed);
        self.compressed.truncate(written);

        #[allow(clippy::cast_possible_truncation)] // Degrees >4B not supported
        let degree = neighbours.len() as u32;
        self.degree = degree;
    }

    /// Drop all neighbours, keeping the allocation
    pub fn clear(&mut self) {
        self.compressed.clear();
        self.degree = 0;
    }
}
