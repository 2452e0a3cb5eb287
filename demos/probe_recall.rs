//! Measure recall of budgeted multi-probe retrieval against exact top-k,
//! sweeping the probe budget.
//!
//! Run with: `cargo run --release --example probe_recall`

use multiprobe_lsh::{DistanceMetric, MultiProbeEngine, MultiProbeEngineBuilder};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn random_unit_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let normal = Normal::new(0.0f32, 1.0).unwrap();
    let mut v: Vec<f32> = (0..dim).map(|_| normal.sample(rng)).collect();
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    for x in &mut v {
        *x /= norm;
    }
    v
}

fn exact_top_k(data: &[Vec<f32>], query: &[f32], k: usize) -> Vec<usize> {
    let q = Array1::from_vec(query.to_vec());
    let mut dists: Vec<(usize, f32)> = data
        .iter()
        .enumerate()
        .map(|(id, v)| {
            let arr = Array1::from_vec(v.clone());
            (id, DistanceMetric::Cosine.compute(&q.view(), &arr.view()))
        })
        .collect();
    dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    dists.truncate(k);
    dists.into_iter().map(|(id, _)| id).collect()
}

fn main() {
    let dim = 30;
    let n = 1 << 14;
    let num_queries = 100;
    let k = 10;

    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<Vec<f32>> = (0..n).map(|_| random_unit_vector(&mut rng, dim)).collect();
    let queries: Vec<Vec<f32>> = (0..num_queries)
        .map(|_| random_unit_vector(&mut rng, dim))
        .collect();

    let engine: MultiProbeEngine<f32> = MultiProbeEngineBuilder::new()
        .dim(dim)
        .bits(16)
        .num_tables(16)
        .num_partitions(4)
        .seed(7)
        .build()
        .unwrap();
    engine.fill(&data).unwrap();

    println!("{}", engine.stats());
    println!("budget  recall@{k}  avg_candidates");

    for budget in [1usize, 2, 4, 8, 16, 32, 64] {
        let mut recall_sum = 0.0;
        let mut candidates_sum = 0usize;

        for q in &queries {
            let truth = exact_top_k(&data, q, k);
            let ranked = engine.k_probe(k, q, budget).unwrap();
            candidates_sum += engine.query(q, budget).unwrap().len();

            let found = ranked.iter().filter(|r| truth.contains(&r.id)).count();
            recall_sum += found as f64 / k as f64;
        }

        println!(
            "{budget:>6}  {:>9.3}  {:>14.1}",
            recall_sum / num_queries as f64,
            candidates_sum as f64 / num_queries as f64
        );
    }
}
