//! Construction-time options for [`GraphStore`](crate::GraphStore)

use crate::codec::VarIntGroupCodec;

/// Default per-vertex degree hint used to pre-size compressed buffers
pub const DEFAULT_RESERVE_DEGREE: usize = 64;

/// Options for building a [`GraphStore`](crate::GraphStore)
///
/// Delta encoding is not recorded in the persisted file, so a store that loads a
/// graph must be configured the same way as the store that wrote it.
///
/// # Example
///
/// ```
/// use trueno_graph_store::{GraphStore, GraphStoreConfig};
///
/// let config = GraphStoreConfig::new(1_000)
///     .with_reserve_degree(32)
///     .with_delta_encoding(true);
/// let store = GraphStore::with_config(&config);
///
/// assert_eq!(store.total_points(), 1_000);
/// assert!(store.codec().is_delta());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStoreConfig {
    /// Initial vertex capacity
    pub total_points: usize,
    /// Expected out-degree, used to reserve buffer space up front
    pub reserve_degree: usize,
    /// Delta-code neighbour lists before group varint packing
    pub delta_encoding: bool,
}

impl GraphStoreConfig {
    /// Config for `total_points` vertices with default options
    #[must_use]
    pub const fn new(total_points: usize) -> Self {
        Self {
            total_points,
            reserve_degree: DEFAULT_RESERVE_DEGREE,
            delta_encoding: false,
        }
    }

    /// Set the reserve-degree hint
    #[must_use]
    pub const fn with_reserve_degree(mut self, reserve_degree: usize) -> Self {
        self.reserve_degree = reserve_degree;
        self
    }

    /// Enable or disable delta coding
    #[must_use]
    pub const fn with_delta_encoding(mut self, delta_encoding: bool) -> Self {
        self.delta_encoding = delta_encoding;
        self
    }

    /// Codec matching this config
    #[must_use]
    pub const fn codec(&self) -> VarIntGroupCodec {
        VarIntGroupCodec::with_delta(self.delta_encoding)
    }
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
