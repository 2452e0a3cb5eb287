#![cfg(feature = "persistence")]

use multiprobe_lsh::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let normal = Normal::new(0.0f32, 1.0).unwrap();
    (0..dim).map(|_| normal.sample(rng)).collect()
}

fn populated_engine(dim: usize, n: usize, seed: u64) -> (MultiProbeEngine<f32>, Vec<Vec<f32>>) {
    let engine: MultiProbeEngine<f32> = MultiProbeEngineBuilder::new()
        .dim(dim)
        .bits(10)
        .num_tables(4)
        .num_partitions(2)
        .seed(seed)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<Vec<f32>> = (0..n).map(|_| random_vector(&mut rng, dim)).collect();
    engine.fill(&data).unwrap();
    (engine, data)
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("multiprobe_lsh_{}_{}", std::process::id(), name))
}

#[test]
fn test_json_round_trip_preserves_queries() {
    let (engine, data) = populated_engine(16, 500, 42);
    let path = temp_path("round_trip.json");

    engine.save_json(&path).unwrap();
    let loaded: MultiProbeEngine<f32> = MultiProbeEngine::load_json(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.len(), engine.len());
    for q in data.iter().take(50) {
        assert_eq!(loaded.query(q, 8).unwrap(), engine.query(q, 8).unwrap());
        let a = engine.k_probe(5, q, 8).unwrap();
        let b = loaded.k_probe(5, q, 8).unwrap();
        assert_eq!(
            a.iter().map(|r| r.id).collect::<Vec<_>>(),
            b.iter().map(|r| r.id).collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_bincode_round_trip_preserves_bucket_order() {
    let engine: MultiProbeEngine<f32> = MultiProbeEngineBuilder::new()
        .dim(4)
        .bits(8)
        .num_tables(2)
        .num_partitions(2)
        .seed(7)
        .build()
        .unwrap();

    // Duplicates and interleaved ids: order inside a bucket must survive.
    let v = [0.3, -0.1, 0.8, 0.2];
    for id in [4, 1, 4, 2, 1] {
        engine.insert(id, &v).unwrap();
    }

    let path = temp_path("round_trip.bin");
    engine.save_bincode(&path).unwrap();
    let loaded: MultiProbeEngine<f32> = MultiProbeEngine::load_bincode(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.query(&v, 1).unwrap(), engine.query(&v, 1).unwrap());
    assert_eq!(loaded.config().seed, Some(7));
    assert_eq!(loaded.config().bits, 8);
    assert_eq!(loaded.config().num_partitions, 2);
}

#[test]
fn test_bucket_table_round_trip_keeps_duplicates() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut table: BucketTable<f64> = BucketTable::new(8, 3, 8, &mut rng).unwrap();
    let v = [0.1, 0.2, 0.3];
    for id in [9, 9, 2, 9] {
        table.insert(id, &v).unwrap();
    }

    let json = serde_json::to_string(&table).unwrap();
    let loaded: BucketTable<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded.query(&v).unwrap(), vec![9, 9, 2, 9]);
    assert_eq!(loaded.len(), 4);
}

#[test]
fn test_loaded_engine_accepts_new_inserts() {
    let (engine, _) = populated_engine(8, 100, 3);
    let path = temp_path("extend.bin");
    engine.save_bincode(&path).unwrap();
    let loaded: MultiProbeEngine<f32> = MultiProbeEngine::load_bincode(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let v = vec![0.5_f32; 8];
    let new_ids = loaded.fill(&[v.clone()]).unwrap();
    // Sequential ids continue past the persisted high-water mark.
    assert_eq!(new_ids, vec![100]);
    assert!(loaded.query(&v, 1).unwrap().contains(&100));
}
