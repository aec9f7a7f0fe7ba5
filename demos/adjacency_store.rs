//! Simple example demonstrating trueno-graph-store usage
//!
//! Run with: RUST_LOG=info cargo run --example adjacency_store

use trueno_graph_store::{GraphStore, NodeId};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("🦀 trueno-graph-store Example\n");

    // 1. Build adjacency lists incrementally
    println!("📊 Building graph...");
    let mut store = GraphStore::new(6, 4);

    store.add_neighbour(NodeId(0), 1)?;
    store.add_neighbour(NodeId(0), 2)?;
    store.add_neighbour(NodeId(0), 70_000)?; // 3-byte id
    store.set_neighbours(NodeId(1), &[0, 2, 3, 4, 5])?;
    store.set_neighbours(NodeId(2), &[1])?;
    // Vertices 3-5 stay empty and log a warning on load

    println!(
        "  ✅ Graph built: {} vertices, {} edges, max degree {}\n",
        store.total_points(),
        store.num_edges(),
        store.get_max_observed_degree()
    );

    // 2. Query neighbours
    println!("🔍 Querying graph...");
    for (vertex, neighbours) in store.iter_adjacency() {
        println!(
            "  vertex {} ({} bytes): {:?}",
            vertex.0,
            store.compressed_len(vertex)?,
            neighbours
        );
    }

    // 3. Persist to the binary graph format
    println!("\n💾 Saving graph...");
    let path = std::env::temp_dir().join("example_adjacency.graph");
    let bytes = store.store(&path, store.total_points(), 0, 0)?;
    println!("  ✅ Saved {} bytes to {}", bytes, path.display());

    // 4. Load into a fresh store
    println!("\n📂 Loading graph...");
    let mut loaded = GraphStore::new(6, 4);
    let summary = loaded.load(&path, 6)?;
    println!(
        "  ✅ Loaded: {} vertices, start {}, widest record {} bytes",
        summary.nodes_read,
        summary.start_vertex_id,
        loaded.get_max_range_of_graph()
    );

    // Verify roundtrip
    for v in 0..6 {
        assert_eq!(loaded.get_neighbours(NodeId(v))?, store.get_neighbours(NodeId(v))?);
    }

    println!("\n✨ Example complete!");

    Ok(())
}
