//! Basic usage: build a forest, query it, save it and load it back.
//!
//! Run with: cargo run --example basic_usage

use grove_db::{build_index, load_index, query, save_index, ForestIndexBuilder};

fn main() -> grove_db::Result<()> {
    println!("=== Random-Projection Forest Demo ===\n");

    // Three tiny 2-d "embeddings"
    let vectors = vec![vec![1.0f32, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
    let index = build_index(&vectors, 5, 2)?;
    println!("{}\n", index.statistics().summary());

    let q = [0.9f32, 0.1];
    println!("Query {:?}, k=2:", q);
    for result in query(&index, &q, 2)? {
        println!("  {} distance {:.4}", result.id, result.distance);
    }

    println!("\n=== Self-Distance Test ===\n");

    // Every stored vector is its own nearest neighbor at distance 0
    for (i, v) in vectors.iter().enumerate() {
        let best = query(&index, v, 1)?;
        println!("item {} -> {} at {:.6}", i, best[0].id, best[0].distance);
    }

    println!("\n=== Larger Corpus ===\n");

    let table = grove_db::dataset::random_table(10_000, 128, 7);
    let start = std::time::Instant::now();
    let index = ForestIndexBuilder::new()
        .vectors(table)
        .tree_count(20)
        .leaf_capacity(64)
        .seed(42)
        .build()?;
    println!(
        "Built {} trees over {} vectors in {:.2?}",
        index.tree_count(),
        index.len(),
        start.elapsed()
    );

    let q = vec![0.5f32; 128];
    let (results, stats) = index.search_with_stats(&q, 10)?;
    println!("Top hit: {} at {:.4}", results[0].id, results[0].distance);
    println!("{}", stats.summary());

    println!("\n=== Persistence ===\n");

    let path = std::env::temp_dir().join("grove_db_basic_usage.grove");
    save_index(&index, &path)?;
    let loaded = load_index(&path)?;
    println!(
        "Reloaded {} trees from {}; identical results: {}",
        loaded.tree_count(),
        path.display(),
        loaded.search(&q, 10)? == results
    );
    std::fs::remove_file(&path)?;

    Ok(())
}
