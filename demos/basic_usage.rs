//! Minimal end-to-end walkthrough: build an engine, insert vectors, run
//! budgeted multi-probe queries, and size a table from collision
//! probabilities.
//!
//! Run with: `cargo run --example basic_usage`

use multiprobe_lsh::{
    sizes_from_probs, DistanceMetric, MultiProbeEngine, MultiProbeEngineBuilder,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let normal = Normal::new(0.0f32, 1.0).unwrap();
    (0..dim).map(|_| normal.sample(rng)).collect()
}

fn main() {
    let dim = 64;
    let n = 10_000;

    // Ask the collision math for a table shape: near pairs agree per bit
    // with probability 0.8, unrelated pairs with 0.3.
    let sizes = sizes_from_probs(n, 0.8, 0.3).unwrap();
    println!(
        "suggested shape for {n} vectors: bits={} num_tables={}",
        sizes.bits, sizes.num_tables
    );

    let engine: MultiProbeEngine<f32> = MultiProbeEngineBuilder::new()
        .dim(dim)
        .bits(sizes.bits)
        .num_tables(sizes.num_tables)
        .num_partitions(2)
        .distance_metric(DistanceMetric::Cosine)
        .seed(42)
        .build()
        .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<Vec<f32>> = (0..n).map(|_| random_vector(&mut rng, dim)).collect();
    engine.fill(&data).unwrap();
    println!("{}", engine.stats());

    // Query with a perturbed copy of a stored vector.
    let mut query = data[1234].clone();
    for x in &mut query {
        *x += 0.01;
    }

    for budget in [1, 4, 16] {
        let ranked = engine.k_probe(5, &query, budget).unwrap();
        println!("budget {budget}: {} candidates", ranked.len());
        for r in &ranked {
            println!("  id={} dist={:.4}", r.id, r.distance);
        }
    }
}
