//! Error types for the adjacency store

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GraphStoreError>;

/// File operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    /// Opening an existing file
    Open,
    /// Creating or truncating a file
    Create,
    /// Reading bytes
    Read,
    /// Writing bytes
    Write,
    /// Repositioning the file cursor
    Seek,
    /// Flushing buffered writes
    Flush,
}

impl fmt::Display for IoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Create => "create",
            Self::Read => "read",
            Self::Write => "write",
            Self::Seek => "seek",
            Self::Flush => "flush",
        };
        f.write_str(name)
    }
}

/// Errors raised by [`GraphStore`](crate::GraphStore) operations
#[derive(Debug, Error)]
pub enum GraphStoreError {
    /// File I/O failed
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        /// Operation that failed
        op: IoOperation,
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Vertex id outside the store's capacity
    #[error("vertex {vertex} out of bounds (capacity {capacity})")]
    VertexOutOfBounds {
        /// Requested vertex
        vertex: u32,
        /// Current vertex capacity
        capacity: usize,
    },

    /// Bytes read diverge from the size declared in the file header
    #[error("graph file {} declares {declared} bytes but {actual} were consumed", .path.display())]
    SizeMismatch {
        /// File being loaded
        path: PathBuf,
        /// `total_index_byte_size` from the header
        declared: u64,
        /// Bytes accounted for when the mismatch was detected
        actual: u64,
    },

    /// A vertex record whose bytes are not a complete group varint stream
    #[error("corrupt adjacency record for vertex {vertex} in {}", .path.display())]
    CorruptRecord {
        /// File being loaded
        path: PathBuf,
        /// Vertex the record belongs to
        vertex: u32,
    },

    /// File holds more vertex records than the store can index
    #[error("graph file {} has more than {capacity} vertex records", .path.display())]
    TooManyRecords {
        /// File being loaded
        path: PathBuf,
        /// Vertex capacity after any resize
        capacity: usize,
    },

    /// Caller-supplied argument is inconsistent with the store
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GraphStoreError {
    pub(crate) fn io(op: IoOperation, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
