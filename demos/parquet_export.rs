//! Export a graph store to Parquet for inspection
//!
//! Run with: cargo run --example parquet_export

use trueno_graph_store::{GraphStore, GraphStoreConfig, NodeId};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🦀 trueno-graph-store Parquet Export\n");

    let config = GraphStoreConfig::new(4)
        .with_reserve_degree(8)
        .with_delta_encoding(true);
    let mut store = GraphStore::with_config(&config);
    store.set_neighbours(NodeId(0), &[1, 2, 3])?;
    store.set_neighbours(NodeId(3), &[0, 2])?;

    let path = std::env::temp_dir().join("example_adjacency");
    store.write_parquet(&path).await?;
    println!("  ✅ Saved to {}_edges.parquet", path.display());
    println!("  ✅ Saved to {}_nodes.parquet", path.display());

    let loaded = GraphStore::read_parquet(&path, &config).await?;
    println!(
        "  ✅ Loaded: {} vertices, {} edges",
        loaded.total_points(),
        loaded.num_edges()
    );
    assert_eq!(loaded.get_neighbours(NodeId(3))?, vec![0, 2]);

    println!("\n✨ Example complete!");

    Ok(())
}
