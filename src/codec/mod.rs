//! Integer codecs for adjacency lists
//!
//! Provides the group-varint codec used to compress every vertex's neighbour list.

pub mod varint_gb;

pub use varint_gb::VarIntGroupCodec;
