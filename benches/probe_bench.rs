use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use multiprobe_lsh::{
    probe_sequence, DistanceMetric, MultiProbeEngine, MultiProbeEngineBuilder, Signature,
};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn generate_vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| StandardNormal.sample(&mut rng)).collect())
        .collect()
}

fn brute_force_query(dataset: &[Vec<f32>], query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let q = Array1::from_vec(query.to_vec());
    let mut dists: Vec<(usize, f32)> = dataset
        .iter()
        .enumerate()
        .map(|(id, v)| {
            let arr = Array1::from_vec(v.clone());
            let d = DistanceMetric::Cosine.compute(&q.view(), &arr.view());
            (id, d)
        })
        .collect();
    dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    dists.truncate(k);
    dists
}

fn build_engine(dim: usize) -> MultiProbeEngine<f32> {
    MultiProbeEngineBuilder::new()
        .dim(dim)
        .bits(16)
        .num_tables(8)
        .num_partitions(4)
        .seed(42)
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Insert throughput
// ---------------------------------------------------------------------------

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for &dim in &[128, 768] {
        for &n in &[1_000usize, 10_000] {
            let vecs = generate_vectors(n, dim, 99);
            group.bench_with_input(
                BenchmarkId::new(format!("dim{dim}"), n),
                &vecs,
                |b, vecs| {
                    b.iter(|| {
                        let engine = build_engine(dim);
                        engine.fill(vecs).unwrap();
                        engine
                    })
                },
            );
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Query latency vs brute force
// ---------------------------------------------------------------------------

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let dim = 128;
    let n = 10_000;

    let vecs = generate_vectors(n, dim, 7);
    let engine = build_engine(dim);
    engine.fill(&vecs).unwrap();
    let query = generate_vectors(1, dim, 11).remove(0);

    group.bench_function("k_probe_budget8", |b| {
        b.iter(|| engine.k_probe(10, &query, 8).unwrap())
    });
    group.bench_function("brute_force", |b| {
        b.iter(|| brute_force_query(&vecs, &query, 10))
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Probe budget sweep
// ---------------------------------------------------------------------------

fn bench_probe_budget(c: &mut Criterion) {
    let mut group = c.benchmark_group("probe_budget");
    let dim = 64;

    let vecs = generate_vectors(20_000, dim, 3);
    let engine = build_engine(dim);
    engine.fill(&vecs).unwrap();
    let query = generate_vectors(1, dim, 5).remove(0);

    for &budget in &[1usize, 4, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(budget), &budget, |b, &budget| {
            b.iter(|| engine.query(&query, budget).unwrap())
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Probe sequence enumeration
// ---------------------------------------------------------------------------

fn bench_probe_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("probe_sequence");
    let sig = Signature::new(0xDEAD_BEEF_CAFE, 48).unwrap();

    for &partitions in &[1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(partitions),
            &partitions,
            |b, &partitions| b.iter(|| probe_sequence(&sig, partitions, 128).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_query,
    bench_probe_budget,
    bench_probe_sequence
);
criterion_main!(benches);
