//! Binary persistence for [`GraphStore`]
//!
//! # Format
//!
//! All integers little-endian:
//!
//! ```text
//! header (24 bytes):
//!   total_index_byte_size: u64   // header + all records
//!   max_observed_degree:   u32
//!   start_vertex_id:       u32
//!   num_frozen_points:     u64
//! records (vertex id order):
//!   byte_length:           u32
//!   compressed_bytes:      [u8; byte_length]
//! ```
//!
//! Records hold the codec output verbatim. Degrees are not stored; they are
//! recovered from the selector bytes when a file is loaded.

use super::adjacency::AdjacencyBuffer;
use super::graph_store::GraphStore;
use crate::codec::VarIntGroupCodec;
use crate::error::{GraphStoreError, IoOperation, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{info, warn};

/// Size of the length prefix in front of every record
const RECORD_PREFIX_SIZE: u64 = 4;

/// Fixed header at the start of a graph file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphHeader {
    /// Size of the whole file (header + records) in bytes
    pub total_index_byte_size: u64,
    /// Largest degree among stored vertices
    pub max_observed_degree: u32,
    /// Entry point of the index
    pub start_vertex_id: u32,
    /// Number of frozen points in the index
    pub num_frozen_points: u64,
}

impl GraphHeader {
    /// Encoded header size in bytes
    pub const SIZE: usize = 24;

    /// Encode as little-endian bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0_u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.total_index_byte_size.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.max_observed_degree.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.start_vertex_id.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.num_frozen_points.to_le_bytes());
        bytes
    }

    /// Decode from little-endian bytes
    #[must_use]
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut u64_buf = [0_u8; 8];
        let mut u32_buf = [0_u8; 4];

        u64_buf.copy_from_slice(&bytes[0..8]);
        let total_index_byte_size = u64::from_le_bytes(u64_buf);
        u32_buf.copy_from_slice(&bytes[8..12]);
        let max_observed_degree = u32::from_le_bytes(u32_buf);
        u32_buf.copy_from_slice(&bytes[12..16]);
        let start_vertex_id = u32::from_le_bytes(u32_buf);
        u64_buf.copy_from_slice(&bytes[16..24]);
        let num_frozen_points = u64::from_le_bytes(u64_buf);

        Self {
            total_index_byte_size,
            max_observed_degree,
            start_vertex_id,
            num_frozen_points,
        }
    }
}

/// Outcome of [`GraphStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of vertex records read
    pub nodes_read: usize,
    /// Entry point recorded in the header
    pub start_vertex_id: u32,
    /// Frozen point count recorded in the header
    pub num_frozen_points: u64,
}

impl GraphStore {
    /// Load a graph file written by [`store`](Self::store)
    ///
    /// Grows the store to `expected_num_points` if it is smaller. Records are
    /// assigned in id order starting at vertex 0; vertices past the last record keep
    /// their current lists. The max observed degree is raised to the header's value,
    /// never lowered. The store's codec must match the one that wrote the file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, if the records do not add up to the
    /// size declared in the header, if there are more records than vertices, or if a
    /// record is not a valid encoded list. The store is left unchanged on error.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        path: P,
        expected_num_points: usize,
    ) -> Result<LoadSummary> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|source| GraphStoreError::io(IoOperation::Open, path, source))?;
        let mut reader = BufReader::new(file);

        let mut header_bytes = [0_u8; GraphHeader::SIZE];
        reader
            .read_exact(&mut header_bytes)
            .map_err(|source| GraphStoreError::io(IoOperation::Read, path, source))?;
        let header = GraphHeader::from_bytes(&header_bytes);
        let declared = header.total_index_byte_size;

        info!(
            path = %path.display(),
            declared_bytes = declared,
            max_observed_degree = header.max_observed_degree,
            start = header.start_vertex_id,
            frozen_points = header.num_frozen_points,
            "graph_store.load.header"
        );

        let mut bytes_read = GraphHeader::SIZE as u64;
        if declared < bytes_read {
            return Err(GraphStoreError::SizeMismatch {
                path: path.to_path_buf(),
                declared,
                actual: bytes_read,
            });
        }

        // Staged; the store is only touched once every record has been read
        let capacity = self.total_points().max(expected_num_points);
        let mut loaded: Vec<AdjacencyBuffer> = Vec::new();
        let mut edges = 0_usize;

        while bytes_read < declared {
            let mut len_bytes = [0_u8; 4];
            read_record(&mut reader, &mut len_bytes, path, declared, bytes_read)?;
            let len = u32::from_le_bytes(len_bytes);

            let record_end = bytes_read + RECORD_PREFIX_SIZE + u64::from(len);
            if record_end > declared {
                return Err(GraphStoreError::SizeMismatch {
                    path: path.to_path_buf(),
                    declared,
                    actual: record_end,
                });
            }
            if loaded.len() >= capacity {
                return Err(GraphStoreError::TooManyRecords {
                    path: path.to_path_buf(),
                    capacity,
                });
            }

            let mut compressed = vec![0_u8; len as usize];
            read_record(&mut reader, &mut compressed, path, declared, bytes_read)?;

            #[allow(clippy::cast_possible_truncation)] // Graphs >4B vertices not supported
            let vertex = loaded.len() as u32;
            if len == 0 {
                warn!(vertex, path = %path.display(), "graph_store.load.empty_adjacency");
            }

            let degree = VarIntGroupCodec::count_values(&compressed).ok_or_else(|| {
                GraphStoreError::CorruptRecord {
                    path: path.to_path_buf(),
                    vertex,
                }
            })?;
            #[allow(clippy::cast_possible_truncation)] // Degrees >4B not supported
            let buffer = AdjacencyBuffer::from_raw(compressed, degree as u32);
            loaded.push(buffer);

            edges += degree;
            bytes_read = record_end;
        }

        if self.total_points() < expected_num_points {
            self.resize(expected_num_points);
        }
        self.observe_degree(header.max_observed_degree);

        let nodes_read = loaded.len();
        for (idx, buffer) in loaded.into_iter().enumerate() {
            self.install_loaded(idx, buffer);
        }

        info!(
            path = %path.display(),
            nodes_read,
            edges,
            start = header.start_vertex_id,
            "graph_store.load.complete"
        );

        Ok(LoadSummary {
            nodes_read,
            start_vertex_id: header.start_vertex_id,
            num_frozen_points: header.num_frozen_points,
        })
    }

    /// Write the first `num_points` vertices to `path`, returning the file size
    ///
    /// Records are streamed; the header is written as a placeholder and rewritten
    /// once the final size and max degree are known.
    ///
    /// # Errors
    ///
    /// Returns error if `num_points` exceeds the vertex capacity or if the file
    /// cannot be created, written, or repositioned.
    pub fn store<P: AsRef<Path>>(
        &self,
        path: P,
        num_points: usize,
        num_frozen_points: u64,
        start_vertex_id: u32,
    ) -> Result<u64> {
        let path = path.as_ref();
        let buffers = self.buffers().get(..num_points).ok_or_else(|| {
            GraphStoreError::InvalidArgument(format!(
                "cannot store {num_points} points from a store of {}",
                self.total_points()
            ))
        })?;

        let file = File::create(path)
            .map_err(|source| GraphStoreError::io(IoOperation::Create, path, source))?;
        let mut writer = BufWriter::new(file);

        let mut header = GraphHeader {
            total_index_byte_size: GraphHeader::SIZE as u64,
            max_observed_degree: self.get_max_observed_degree(),
            start_vertex_id,
            num_frozen_points,
        };
        write_bytes(&mut writer, &header.to_bytes(), path)?;

        let mut max_degree = 0_u32;
        for buffer in buffers {
            let bytes = buffer.as_bytes();
            #[allow(clippy::cast_possible_truncation)] // Records >4GB not supported
            let len = bytes.len() as u32;

            write_bytes(&mut writer, &len.to_le_bytes(), path)?;
            write_bytes(&mut writer, bytes, path)?;

            max_degree = max_degree.max(buffer.degree());
            header.total_index_byte_size += RECORD_PREFIX_SIZE + u64::from(len);
        }
        header.max_observed_degree = max_degree;

        writer
            .seek(SeekFrom::Start(0))
            .map_err(|source| GraphStoreError::io(IoOperation::Seek, path, source))?;
        write_bytes(&mut writer, &header.to_bytes(), path)?;
        writer
            .flush()
            .map_err(|source| GraphStoreError::io(IoOperation::Flush, path, source))?;

        info!(
            path = %path.display(),
            num_points,
            bytes = header.total_index_byte_size,
            max_degree,
            "graph_store.store.complete"
        );

        Ok(header.total_index_byte_size)
    }
}

fn write_bytes(writer: &mut impl Write, bytes: &[u8], path: &Path) -> Result<()> {
    writer
        .write_all(bytes)
        .map_err(|source| GraphStoreError::io(IoOperation::Write, path, source))
}

/// Read part of a record; running out of file is a size mismatch
fn read_record(
    reader: &mut impl Read,
    buf: &mut [u8],
    path: &Path,
    declared: u64,
    bytes_read: u64,
) -> Result<()> {
    reader.read_exact(buf).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            GraphStoreError::SizeMismatch {
                path: path.to_path_buf(),
                declared,
                actual: bytes_read,
            }
        } else {
            GraphStoreError::io(IoOperation::Read, path, source)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphStoreConfig, NodeId};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Log sink shared between a test and its `tracing` subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample_store() -> GraphStore {
        let mut store = GraphStore::new(4, 8);
        store.set_neighbours(NodeId(0), &[1, 2, 3]).unwrap();
        store.set_neighbours(NodeId(1), &[0, 70_000, u32::MAX, 3, 2]).unwrap();
        store.add_neighbour(NodeId(3), 1).unwrap();
        store
    }

    fn write_file(path: &Path, header: &GraphHeader, records: &[&[u8]]) {
        let mut bytes = header.to_bytes().to_vec();
        for record in records {
            bytes.extend_from_slice(&(record.len() as u32).to_le_bytes());
            bytes.extend_from_slice(record);
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_header_layout() {
        let header = GraphHeader {
            total_index_byte_size: 0x0102,
            max_observed_degree: 7,
            start_vertex_id: 3,
            num_frozen_points: 1,
        };
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[7, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[3, 0, 0, 0]);
        assert_eq!(&bytes[16..24], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(GraphHeader::from_bytes(&bytes), header);
    }

    #[test]
    fn test_store_writes_exact_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let store = sample_store();

        let written = store.store(&path, 4, 1, 2).unwrap();
        let expected = 24
            + store
                .buffers()
                .iter()
                .map(|b| 4 + b.byte_len() as u64)
                .sum::<u64>();

        assert_eq!(written, expected);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), expected);

        let raw = std::fs::read(&path).unwrap();
        let mut header_bytes = [0_u8; GraphHeader::SIZE];
        header_bytes.copy_from_slice(&raw[..GraphHeader::SIZE]);
        let header = GraphHeader::from_bytes(&header_bytes);
        assert_eq!(header.total_index_byte_size, expected);
        assert_eq!(header.max_observed_degree, 5);
        assert_eq!(header.start_vertex_id, 2);
        assert_eq!(header.num_frozen_points, 1);
    }

    #[test]
    fn test_store_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let store = sample_store();
        store.store(&path, 4, 1, 2).unwrap();

        let mut loaded = GraphStore::new(4, 8);
        let summary = loaded.load(&path, 4).unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                nodes_read: 4,
                start_vertex_id: 2,
                num_frozen_points: 1
            }
        );
        for v in 0..4 {
            assert_eq!(
                loaded.get_neighbours(NodeId(v)).unwrap(),
                store.get_neighbours(NodeId(v)).unwrap()
            );
            assert_eq!(
                loaded.degree(NodeId(v)).unwrap(),
                store.degree(NodeId(v)).unwrap()
            );
        }
        assert_eq!(loaded.get_max_observed_degree(), 5);
        assert_eq!(
            loaded.get_max_range_of_graph(),
            store.compressed_len(NodeId(1)).unwrap()
        );
    }

    #[test]
    fn test_loaded_lists_accept_mutation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        sample_store().store(&path, 4, 0, 0).unwrap();

        let mut loaded = GraphStore::new(0, 8);
        loaded.load(&path, 4).unwrap();
        loaded.add_neighbour(NodeId(0), 9).unwrap();

        assert_eq!(loaded.get_neighbours(NodeId(0)).unwrap(), vec![1, 2, 3, 9]);
    }

    #[test]
    fn test_load_resizes_to_expected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        sample_store().store(&path, 2, 0, 0).unwrap();

        let mut loaded = GraphStore::new(1, 8);
        let summary = loaded.load(&path, 6).unwrap();

        assert_eq!(summary.nodes_read, 2);
        assert_eq!(loaded.total_points(), 6);
        assert_eq!(loaded.get_neighbours(NodeId(0)).unwrap(), vec![1, 2, 3]);
        assert!(loaded.get_neighbours(NodeId(5)).unwrap().is_empty());
    }

    #[test]
    fn test_store_rejects_too_many_points() {
        let dir = tempdir().unwrap();
        let err = sample_store()
            .store(dir.path().join("graph.bin"), 5, 0, 0)
            .unwrap_err();
        assert!(matches!(err, GraphStoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_record_loads_with_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let list = VarIntGroupCodec::new().encode_to_vec(&[4, 5]);
        let header = GraphHeader {
            total_index_byte_size: 24 + 4 + 4 + list.len() as u64,
            max_observed_degree: 2,
            start_vertex_id: 0,
            num_frozen_points: 0,
        };
        write_file(&path, &header, &[&[], &list]);

        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let mut store = GraphStore::new(2, 4);
        let summary =
            tracing::subscriber::with_default(subscriber, || store.load(&path, 2)).unwrap();

        assert_eq!(summary.nodes_read, 2);
        assert!(store.get_neighbours(NodeId(0)).unwrap().is_empty());
        assert_eq!(store.get_neighbours(NodeId(1)).unwrap(), vec![4, 5]);

        let output = logs.contents();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("graph_store.load.empty_adjacency"), "{output}");
        assert!(output.contains("vertex=0"), "{output}");
        assert!(!output.contains("vertex=1"), "{output}");
    }

    #[test]
    fn test_load_raises_max_degree_of_populated_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");

        let mut small = GraphStore::new(2, 4);
        small.set_neighbours(NodeId(0), &[1, 2]).unwrap();
        small.set_neighbours(NodeId(1), &[0]).unwrap();
        small.store(&path, 2, 0, 0).unwrap();

        let mut store = GraphStore::new(4, 4);
        let wide: Vec<u32> = (0..10).collect();
        store.set_neighbours(NodeId(3), &wide).unwrap();
        store.load(&path, 4).unwrap();

        assert_eq!(store.get_neighbours(NodeId(0)).unwrap(), vec![1, 2]);
        assert_eq!(store.get_neighbours(NodeId(3)).unwrap(), wide);
        assert_eq!(store.get_max_observed_degree(), 10);
    }

    #[test]
    fn test_failed_load_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");

        let mut source = GraphStore::new(3, 4);
        for v in 0..3 {
            source.set_neighbours(NodeId(v), &[7, 8, 9]).unwrap();
        }
        source.store(&path, 3, 0, 0).unwrap();
        let raw = std::fs::read(&path).unwrap();
        std::fs::write(&path, &raw[..raw.len() - 2]).unwrap();

        let mut store = GraphStore::new(1, 4);
        store.set_neighbours(NodeId(0), &[1]).unwrap();

        let err = store.load(&path, 3).unwrap_err();
        assert!(matches!(err, GraphStoreError::SizeMismatch { .. }));
        assert_eq!(store.total_points(), 1);
        assert_eq!(store.get_neighbours(NodeId(0)).unwrap(), vec![1]);
        assert_eq!(store.get_max_observed_degree(), 1);
        assert_eq!(store.get_max_range_of_graph(), 0);
    }

    #[test]
    fn test_corrupt_later_record_keeps_earlier_vertices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let good = VarIntGroupCodec::new().encode_to_vec(&[5, 6]);
        let bad: &[u8] = &[0x03, 0x01];
        let header = GraphHeader {
            total_index_byte_size: 24 + 4 + good.len() as u64 + 4 + 2,
            max_observed_degree: 2,
            start_vertex_id: 0,
            num_frozen_points: 0,
        };
        write_file(&path, &header, &[&good, bad]);

        let mut store = GraphStore::new(2, 4);
        store.set_neighbours(NodeId(0), &[42]).unwrap();

        let err = store.load(&path, 2).unwrap_err();
        assert!(matches!(
            err,
            GraphStoreError::CorruptRecord { vertex: 1, .. }
        ));
        assert_eq!(store.get_neighbours(NodeId(0)).unwrap(), vec![42]);
        assert_eq!(store.get_max_observed_degree(), 1);
    }

    #[test]
    fn test_truncated_file_is_size_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        sample_store().store(&path, 4, 0, 0).unwrap();

        let raw = std::fs::read(&path).unwrap();
        std::fs::write(&path, &raw[..raw.len() - 2]).unwrap();

        let err = GraphStore::new(4, 4).load(&path, 4).unwrap_err();
        assert!(matches!(err, GraphStoreError::SizeMismatch { .. }));
    }

    #[test]
    fn test_record_overrunning_declared_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let list = VarIntGroupCodec::new().encode_to_vec(&[1, 2, 3]);
        let header = GraphHeader {
            total_index_byte_size: 24 + 4 + 2,
            max_observed_degree: 3,
            start_vertex_id: 0,
            num_frozen_points: 0,
        };
        write_file(&path, &header, &[&list]);

        let err = GraphStore::new(1, 4).load(&path, 1).unwrap_err();
        assert!(matches!(
            err,
            GraphStoreError::SizeMismatch {
                declared: 30,
                actual: 32,
                ..
            }
        ));
    }

    #[test]
    fn test_declared_size_below_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let header = GraphHeader {
            total_index_byte_size: 8,
            max_observed_degree: 0,
            start_vertex_id: 0,
            num_frozen_points: 0,
        };
        write_file(&path, &header, &[]);

        let err = GraphStore::new(1, 4).load(&path, 1).unwrap_err();
        assert!(matches!(err, GraphStoreError::SizeMismatch { .. }));
    }

    #[test]
    fn test_more_records_than_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        sample_store().store(&path, 4, 0, 0).unwrap();

        let mut store = GraphStore::new(2, 4);
        store.set_neighbours(NodeId(1), &[3]).unwrap();

        let err = store.load(&path, 2).unwrap_err();
        assert!(matches!(
            err,
            GraphStoreError::TooManyRecords { capacity: 2, .. }
        ));
        assert!(store.get_neighbours(NodeId(0)).unwrap().is_empty());
        assert_eq!(store.get_neighbours(NodeId(1)).unwrap(), vec![3]);
    }

    #[test]
    fn test_corrupt_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        // Selector declares a 4-byte value but only one byte follows
        let record: &[u8] = &[0x03, 0x01];
        let header = GraphHeader {
            total_index_byte_size: 24 + 4 + 2,
            max_observed_degree: 1,
            start_vertex_id: 0,
            num_frozen_points: 0,
        };
        write_file(&path, &header, &[record]);

        let err = GraphStore::new(1, 4).load(&path, 1).unwrap_err();
        assert!(matches!(
            err,
            GraphStoreError::CorruptRecord { vertex: 0, .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.bin");

        let err = GraphStore::new(1, 4).load(&path, 1).unwrap_err();
        match err {
            GraphStoreError::Io { op, path: p, .. } => {
                assert_eq!(op, IoOperation::Open);
                assert_eq!(p, path);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_delta_store_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let config = GraphStoreConfig::new(2).with_delta_encoding(true);

        let mut store = GraphStore::with_config(&config);
        store.set_neighbours(NodeId(0), &[10, 9, 1_000_000, 2]).unwrap();
        store.set_neighbours(NodeId(1), &[0]).unwrap();
        store.store(&path, 2, 0, 1).unwrap();

        let mut loaded = GraphStore::with_config(&config);
        loaded.load(&path, 2).unwrap();

        assert_eq!(
            loaded.get_neighbours(NodeId(0)).unwrap(),
            vec![10, 9, 1_000_000, 2]
        );
        assert_eq!(loaded.get_neighbours(NodeId(1)).unwrap(), vec![0]);
    }
}
