//! # multiprobe-lsh
//!
//! An in-memory approximate-nearest-neighbor index built on
//! locality-sensitive hashing (LSH), with multi-table querying and
//! partitioned multi-probe bucket exploration.
//!
//! Vectors are hashed to compact bit signatures by sign-of-random-projection
//! families (the SimpleLSH construction handles cosine search without
//! per-vector normalization). Near vectors land in the same bucket with high
//! probability, so queries retrieve short candidate lists instead of
//! scanning everything. Recall is raised two ways: independent tables OR'd
//! together, and probing buckets at small Hamming distance from the query's
//! own signature, enumerated per bit-range partition in strictly
//! non-decreasing distance.
//!
//! ## Quick start
//!
//! ```rust
//! use multiprobe_lsh::{MultiProbeEngine, MultiProbeEngineBuilder};
//!
//! let engine: MultiProbeEngine<f32> = MultiProbeEngineBuilder::new()
//!     .dim(128)
//!     .bits(16)
//!     .num_tables(8)
//!     .num_partitions(4)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! // Insert vectors.
//! let v = vec![0.1_f32; 128];
//! engine.insert(0, &v).unwrap();
//!
//! // Ranked retrieval probing up to 8 buckets per table.
//! for r in engine.k_probe(5, &v, 8).unwrap() {
//!     println!("id={} dist={:.4}", r.id, r.distance);
//! }
//! ```
//!
//! Sizing a table before building it:
//!
//! ```rust
//! use multiprobe_lsh::collision::sizes_from_probs;
//!
//! let sizes = sizes_from_probs(100_000, 0.8, 0.3).unwrap();
//! assert!(sizes.bits >= 1 && sizes.num_tables >= 1);
//! ```
//!
//! ## Feature flags
//!
//! | Flag          | Effect                                        |
//! |---------------|-----------------------------------------------|
//! | `parallel`    | Parallel batch query via rayon                |
//! | `persistence` | Save/load engine to disk (serde + bincode)    |
//! | `python`      | Python bindings via PyO3                      |
//! | `full`        | Enables `parallel` + `persistence`            |

pub mod collision;
pub mod distance;
pub mod element;
pub mod error;
pub mod hash;
pub mod metrics;
pub mod multi_table;
pub mod probe;
pub mod signature;
pub mod table;

#[cfg(feature = "persistence")]
pub mod persistence;

#[cfg(feature = "python")]
pub mod python;

// Re-exports for convenience.
pub use collision::{same_bits, sizes_from_probs, TableSizes};
pub use distance::DistanceMetric;
pub use element::{Element, ElementType};
pub use error::{LshError, Result};
pub use hash::HashFamily;
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use multi_table::MultiTableIndex;
pub use probe::{
    probe_sequence, IndexStats, MultiProbeEngine, MultiProbeEngineBuilder, ProbeConfig,
    ProbeStep, QueryResult,
};
pub use signature::{Signature, MAX_BITS};
pub use table::BucketTable;
