//! Parquet export of decoded adjacency lists
//!
//! Based on `DuckDB` (Raasveldt et al., SIGMOD 2019) columnar storage patterns.
//!
//! # Format
//!
//! A store is exported as two Parquet files:
//! - `{path}_edges.parquet`: (source, target) in stored neighbour order
//! - `{path}_nodes.parquet`: (vertex, degree) for every vertex, including empty ones
//!
//! The native binary format (see [`GraphStore::store`]) stays the primary
//! persistence path; Parquet is for inspection and interchange.

use super::graph_store::{GraphStore, NodeId};
use crate::config::GraphStoreConfig;
use anyhow::{ensure, Context, Result};
use arrow::array::UInt32Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

impl GraphStore {
    /// Write decoded adjacency lists to Parquet files
    ///
    /// Creates two files:
    /// - `{path}_edges.parquet`: Edge list (source, target)
    /// - `{path}_nodes.parquet`: Vertex degrees (vertex, degree)
    ///
    /// # Errors
    ///
    /// Returns error if file I/O fails or Arrow conversion fails
    #[allow(clippy::unused_async)] // Async API for future I/O operations
    pub async fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let base_path = path.as_ref();

        let mut sources = Vec::with_capacity(self.num_edges());
        let mut targets = Vec::with_capacity(self.num_edges());
        let mut vertices = Vec::with_capacity(self.total_points());
        let mut degrees = Vec::with_capacity(self.total_points());

        for (vertex, neighbours) in self.iter_adjacency() {
            #[allow(clippy::cast_possible_truncation)] // Degrees >4B not supported
            let degree = neighbours.len() as u32;
            vertices.push(vertex.0);
            degrees.push(degree);

            for target in neighbours {
                sources.push(vertex.0);
                targets.push(target);
            }
        }

        write_u32_columns(
            &format!("{}_edges.parquet", base_path.display()),
            ["source", "target"],
            sources,
            targets,
        )?;
        write_u32_columns(
            &format!("{}_nodes.parquet", base_path.display()),
            ["vertex", "degree"],
            vertices,
            degrees,
        )?;

        Ok(())
    }

    /// Rebuild a store from Parquet files written by [`write_parquet`](Self::write_parquet)
    ///
    /// The store gets `config`'s options and at least as many vertices as the nodes
    /// file lists.
    ///
    /// # Errors
    ///
    /// Returns error if files don't exist, Arrow conversion fails, or the edge and
    /// degree files disagree
    #[allow(clippy::unused_async)] // Async API for future I/O operations
    pub async fn read_parquet<P: AsRef<Path>>(path: P, config: &GraphStoreConfig) -> Result<Self> {
        let base_path = path.as_ref();

        let nodes = read_u32_columns(&format!("{}_nodes.parquet", base_path.display()))?;
        let edges = read_u32_columns(&format!("{}_edges.parquet", base_path.display()))?;

        let total_points = nodes
            .iter()
            .map(|&(vertex, _)| vertex as usize + 1)
            .max()
            .unwrap_or(0)
            .max(config.total_points);

        let mut lists: Vec<Vec<u32>> = vec![Vec::new(); total_points];
        for (source, target) in edges {
            let list = lists
                .get_mut(source as usize)
                .with_context(|| format!("Edge source {source} has no vertex row"))?;
            list.push(target);
        }

        for &(vertex, degree) in &nodes {
            let actual = lists[vertex as usize].len();
            ensure!(
                actual == degree as usize,
                "Vertex {vertex} lists degree {degree} but has {actual} edges"
            );
        }

        let mut store = Self::with_config(&GraphStoreConfig {
            total_points,
            ..*config
        });
        for (idx, neighbours) in lists.iter().enumerate() {
            if neighbours.is_empty() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)] // Graphs >4B vertices not supported
            let vertex = NodeId(idx as u32);
            store.set_neighbours(vertex, neighbours)?;
        }

        Ok(store)
    }
}

fn write_u32_columns(
    file_path: &str,
    names: [&str; 2],
    first: Vec<u32>,
    second: Vec<u32>,
) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(names[0], DataType::UInt32, false),
        Field::new(names[1], DataType::UInt32, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(UInt32Array::from(first)),
            Arc::new(UInt32Array::from(second)),
        ],
    )
    .with_context(|| format!("Failed to create RecordBatch for {file_path}"))?;

    let file = File::create(file_path).with_context(|| format!("Failed to create {file_path}"))?;

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::ZSTD(
            parquet::basic::ZstdLevel::try_new(3)?,
        ))
        .build();

    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn read_u32_columns(file_path: &str) -> Result<Vec<(u32, u32)>> {
    let file = File::open(file_path).with_context(|| format!("Failed to open {file_path}"))?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch: RecordBatch = batch_result?;
        ensure!(
            batch.num_columns() >= 2,
            "Expected two columns in {file_path}, found {}",
            batch.num_columns()
        );

        let first = batch
            .column(0)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .with_context(|| format!("Invalid first column type in {file_path}"))?;

        let second = batch
            .column(1)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .with_context(|| format!("Invalid second column type in {file_path}"))?;

        for i in 0..batch.num_rows() {
            rows.push((first.value(i), second.value(i)));
        }
    }

    Ok(rows)
}
