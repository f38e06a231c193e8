//! Measure forest recall against exact search for several tree counts.
//!
//! Run with: cargo run --example measure_recall --release

use grove_db::{recall_at_k, Dataset, DistanceMetric, ForestIndexBuilder};

fn main() -> grove_db::Result<()> {
    println!("Generating dataset...");
    let mut dataset = Dataset::generate(10_000, 100, 64, 42);

    println!("Computing ground truth with brute force...");
    let k = 10;
    dataset.compute_ground_truth(k, DistanceMetric::Angular)?;

    println!("Measuring recall@{}...\n", k);
    println!("{:>6} {:>10} {:>12} {:>10}", "trees", "recall", "candidates", "query");

    for trees in [1, 5, 10, 25, 50] {
        let index = ForestIndexBuilder::new()
            .vectors(dataset.vectors.clone())
            .tree_count(trees)
            .leaf_capacity(64)
            .seed(7)
            .build()?;

        let mut total_recall = 0.0;
        let mut total_candidates = 0;
        let mut total_ms = 0.0;
        for (query, truth) in dataset.queries.iter().zip(&dataset.ground_truth) {
            let (results, stats) = index.search_with_stats(query, k)?;
            let predicted: Vec<_> = results.iter().map(|r| r.id).collect();
            total_recall += recall_at_k(&predicted, truth, k);
            total_candidates += stats.unique_candidates;
            total_ms += stats.query_time_ms();
        }

        let n = dataset.queries.len() as f32;
        println!(
            "{:>6} {:>9.1}% {:>12.0} {:>8.3}ms",
            trees,
            total_recall / n * 100.0,
            total_candidates as f32 / n,
            total_ms / n
        );
    }

    println!("\nMore trees surface more candidates: recall rises, and so does query time.");
    Ok(())
}
