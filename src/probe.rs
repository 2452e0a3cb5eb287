use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use log::trace;
use ndarray::Array1;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::distance::{self, DistanceMetric};
use crate::element::Element;
use crate::error::{LshError, Result};
use crate::metrics::{MetricsCollector, MetricsSnapshot, QueryTimer};
use crate::multi_table::MultiTableIndex;
use crate::signature::Signature;

// ---------------------------------------------------------------------------
// Probe sequence generation
// ---------------------------------------------------------------------------

/// One probe: a bucket signature and its Hamming distance from the query's
/// own signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStep {
    pub signature: Signature,
    pub distance: u32,
}

/// A contiguous bit range of the signature probed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
struct Partition {
    offset: usize,
    len: usize,
}

/// Split `width` bits into `count` contiguous partitions whose sizes differ
/// by at most one (earlier partitions take the remainder).
fn partition_ranges(width: usize, count: usize) -> Vec<Partition> {
    let base = width / count;
    let extra = width % count;
    let mut parts = Vec::with_capacity(count);
    let mut offset = 0;
    for i in 0..count {
        let len = base + usize::from(i < extra);
        parts.push(Partition { offset, len });
        offset += len;
    }
    parts
}

/// Flip masks for one partition in strictly non-decreasing Hamming weight,
/// capped at `cap` entries. Within a weight, masks come out in lexicographic
/// order of their flipped bit positions.
fn partition_masks(part: Partition, cap: usize) -> Vec<(u64, u32)> {
    let mut masks = vec![(0u64, 0u32)];
    'weights: for w in 1..=part.len {
        // Walk w-combinations of bit positions within the partition.
        let mut pos: Vec<usize> = (0..w).collect();
        loop {
            if masks.len() >= cap {
                break 'weights;
            }
            let mask = pos
                .iter()
                .fold(0u64, |acc, &b| acc | (1u64 << (part.offset + b)));
            masks.push((mask, w as u32));

            // Advance to the next combination: bump the rightmost position
            // that still has headroom, then close up the tail behind it.
            let mut i = w;
            while i > 0 && pos[i - 1] == part.len - w + i - 1 {
                i -= 1;
            }
            if i == 0 {
                break;
            }
            pos[i - 1] += 1;
            for k in i..w {
                pos[k] = pos[k - 1] + 1;
            }
        }
    }
    masks
}

/// Enumerate the buckets to probe for a query signature, in non-decreasing
/// Hamming distance, up to `budget` probes.
///
/// The signature is split into `num_partitions` disjoint contiguous bit
/// ranges. Each partition enumerates its own flip masks by increasing
/// weight; global probes combine one mask per partition (each partition
/// touches only its own bit range) and are merged lazily by total distance,
/// so one partition costs `O(2^bits)` enumeration in the worst case while
/// `P` partitions each scan only their `bits/P`-bit subspace.
///
/// The first step is always the query's own signature at distance 0.
pub fn probe_sequence(
    sig: &Signature,
    num_partitions: usize,
    budget: usize,
) -> Result<Vec<ProbeStep>> {
    let width = sig.width();
    if num_partitions == 0 || num_partitions > width {
        return Err(LshError::InvalidParameter(format!(
            "num_partitions must be in 1..={width}, got {num_partitions}"
        )));
    }
    if budget == 0 {
        return Ok(Vec::new());
    }

    let parts = partition_ranges(width, num_partitions);
    // No combined probe ever indexes past `budget` entries of one partition:
    // reaching index c costs at least c earlier pops.
    let lists: Vec<Vec<(u64, u32)>> = parts
        .iter()
        .map(|&p| partition_masks(p, budget))
        .collect();

    // Lazy Cartesian merge: a min-heap over index tuples, ordered by total
    // weight then tuple order for determinism. A tuple may bump index j only
    // when every later index is still 0, so each tuple is produced once.
    let mut heap: BinaryHeap<Reverse<(u32, Vec<usize>)>> = BinaryHeap::new();
    heap.push(Reverse((0, vec![0; lists.len()])));

    let mut steps = Vec::with_capacity(budget);
    while let Some(Reverse((total, idxs))) = heap.pop() {
        let mask = idxs
            .iter()
            .zip(&lists)
            .fold(0u64, |acc, (&i, list)| acc | list[i].0);
        steps.push(ProbeStep {
            signature: sig.flipped(mask),
            distance: total,
        });
        if steps.len() == budget {
            break;
        }

        for j in (0..idxs.len()).rev() {
            if idxs[j] + 1 < lists[j].len() {
                let mut next = idxs.clone();
                next[j] += 1;
                let weight: u32 = next.iter().zip(&lists).map(|(&i, list)| list[i].1).sum();
                heap.push(Reverse((weight, next)));
            }
            if idxs[j] != 0 {
                break;
            }
        }
    }

    Ok(steps)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for [`MultiProbeEngine`].
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ProbeConfig {
    /// Dimensionality of vectors.
    pub dim: usize,
    /// Signature width per table (1..=64).
    pub bits: usize,
    /// Number of independent hash tables.
    pub num_tables: usize,
    /// Number of disjoint bit ranges probed independently (1..=bits).
    pub num_partitions: usize,
    /// Capacity hint for each table's bucket map.
    pub num_buckets: usize,
    /// Distance metric for ranked retrieval.
    pub distance_metric: DistanceMetric,
    /// Whether to L2-normalize vectors on insertion. SimpleLSH hashing
    /// assumes norms at most 1, so this stays on unless the caller scales
    /// data themselves.
    pub normalize_vectors: bool,
    /// Optional RNG seed for reproducible projections.
    pub seed: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            dim: 768,
            bits: 16,
            num_tables: 8,
            num_partitions: 4,
            num_buckets: 1024,
            distance_metric: DistanceMetric::Cosine,
            normalize_vectors: true,
            seed: None,
        }
    }
}

/// A single ranked retrieval result.
#[derive(Debug, Clone)]
pub struct QueryResult<E: Element> {
    /// The vector ID.
    pub id: usize,
    /// Distance from the query vector (lower is closer).
    pub distance: E,
}

/// Aggregate statistics about the engine.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub num_vectors: usize,
    pub num_tables: usize,
    pub num_partitions: usize,
    pub bits: usize,
    pub dimension: usize,
    pub total_buckets: usize,
    pub avg_bucket_size: f64,
    pub max_bucket_size: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MultiProbeEngine {{ vectors: {}, tables: {}, partitions: {}, bits: {}, dim: {}, \
             buckets: {}, avg_bucket: {:.1}, max_bucket: {} }}",
            self.num_vectors,
            self.num_tables,
            self.num_partitions,
            self.bits,
            self.dimension,
            self.total_buckets,
            self.avg_bucket_size,
            self.max_bucket_size,
        )
    }
}

// ---------------------------------------------------------------------------
// Inner state (behind RwLock)
// ---------------------------------------------------------------------------

#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub(crate) struct ProbeInner<E: Element> {
    pub(crate) index: MultiTableIndex<E>,
    pub(crate) vectors: HashMap<usize, Array1<E>>,
    pub(crate) config: ProbeConfig,
    pub(crate) next_id: usize,
}

// ---------------------------------------------------------------------------
// MultiProbeEngine
// ---------------------------------------------------------------------------

/// Multi-table LSH index that also probes buckets near the query's own.
///
/// Instead of relying only on exact signature collisions, a query examines
/// a budgeted sequence of buckets at increasing Hamming distance from its
/// signature in every table, trading extra lookups for recall without extra
/// tables.
///
/// Thread-safe: concurrent queries proceed in parallel; inserts take
/// exclusive access via `parking_lot::RwLock`.
pub struct MultiProbeEngine<E: Element> {
    pub(crate) inner: RwLock<ProbeInner<E>>,
    pub(crate) metrics: Option<Arc<MetricsCollector>>,
}

impl<E: Element> std::fmt::Debug for MultiProbeEngine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("MultiProbeEngine")
            .field("num_vectors", &inner.vectors.len())
            .field("config", &inner.config)
            .field("has_metrics", &self.metrics.is_some())
            .finish()
    }
}

impl<E: Element> MultiProbeEngine<E> {
    /// Start building an engine with the builder pattern.
    pub fn builder() -> MultiProbeEngineBuilder {
        MultiProbeEngineBuilder::new()
    }

    /// Create an engine directly from a [`ProbeConfig`].
    pub fn new(config: ProbeConfig) -> Result<Self> {
        Self::new_with_metrics(config, false)
    }

    fn new_with_metrics(config: ProbeConfig, enable_metrics: bool) -> Result<Self> {
        if config.num_partitions == 0 || config.num_partitions > config.bits {
            return Err(LshError::InvalidParameter(format!(
                "num_partitions must be in 1..={}, got {}",
                config.bits, config.num_partitions
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let index = MultiTableIndex::new(
            config.num_tables,
            config.bits,
            config.dim,
            config.num_buckets,
            &mut rng,
        )?;

        let metrics = enable_metrics.then(|| Arc::new(MetricsCollector::new()));

        Ok(Self {
            inner: RwLock::new(ProbeInner {
                index,
                vectors: HashMap::new(),
                config,
                next_id: 0,
            }),
            metrics,
        })
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Insert a vector with the given ID.
    ///
    /// IDs are opaque to the engine. Re-inserting an ID appends it to the
    /// buckets again (tables never dedup) and replaces the stored vector.
    pub fn insert(&self, id: usize, vector: &[E]) -> Result<()> {
        let mut inner = self.inner.write();

        let prepared = inner.prepare(vector)?;
        inner.index.insert(id, &prepared)?;
        inner.vectors.insert(id, Array1::from_vec(prepared));
        if id >= inner.next_id {
            inner.next_id = id + 1;
        }

        if let Some(ref m) = self.metrics {
            m.record_insert();
        }
        Ok(())
    }

    /// Insert a batch of vectors, assigning sequential IDs starting at the
    /// current high-water mark. Returns the assigned IDs.
    pub fn fill(&self, vectors: &[Vec<E>]) -> Result<Vec<usize>> {
        let mut inner = self.inner.write();
        let mut ids = Vec::with_capacity(vectors.len());

        // Validate the whole batch before touching any table so a bad
        // vector in the middle mutates nothing.
        let prepared: Vec<Vec<E>> = vectors
            .iter()
            .map(|v| inner.prepare(v))
            .collect::<Result<_>>()?;

        for v in prepared {
            let id = inner.next_id;
            inner.index.insert(id, &v)?;
            inner.vectors.insert(id, Array1::from_vec(v));
            inner.next_id = id + 1;
            ids.push(id);
            if let Some(ref m) = self.metrics {
                m.record_insert();
            }
        }
        Ok(ids)
    }

    // ------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------

    /// Candidate IDs for `vector`, probing up to `budget` buckets per table.
    ///
    /// Candidates come back ordered by the Hamming distance of the probe
    /// that found them (closer buckets first), then by first-seen order, and
    /// are deduplicated by ID. No similarity ranking is applied; use
    /// [`k_probe`](Self::k_probe) for ranked retrieval.
    pub fn query(&self, vector: &[E], budget: usize) -> Result<Vec<usize>> {
        let timer = self.metrics.as_ref().map(|_| QueryTimer::new());
        let inner = self.inner.read();

        let prepared = inner.prepare(vector)?;

        let mut hits: Vec<(u32, usize)> = Vec::new();
        let mut seen = HashSet::new();

        for table in inner.index.tables() {
            let sig = table.signature(&prepared)?;
            let steps = probe_sequence(&sig, inner.config.num_partitions, budget)?;
            trace!(
                "probing {} buckets (budget {budget}) in table, base signature {sig}",
                steps.len()
            );
            for step in steps {
                match table.bucket(&step.signature) {
                    Some(bucket) => {
                        if let Some(ref m) = self.metrics {
                            m.record_bucket_hit();
                        }
                        for &id in bucket {
                            if seen.insert(id) {
                                hits.push((step.distance, id));
                            }
                        }
                    }
                    None => {
                        if let Some(ref m) = self.metrics {
                            m.record_bucket_miss();
                        }
                    }
                }
                if let Some(ref m) = self.metrics {
                    m.record_probe();
                }
            }
        }

        // Stable: equal distances keep first-seen order across tables.
        hits.sort_by_key(|&(d, _)| d);
        let candidates: Vec<usize> = hits.into_iter().map(|(_, id)| id).collect();

        if let Some(ref m) = self.metrics {
            if let Some(t) = timer {
                m.record_query(candidates.len() as u64, t.elapsed_ns());
            }
        }
        Ok(candidates)
    }

    /// The `k` best candidates for `vector`, ranked by the configured
    /// distance metric, probing up to `budget` buckets per table.
    pub fn k_probe(&self, k: usize, vector: &[E], budget: usize) -> Result<Vec<QueryResult<E>>> {
        let candidates = self.query(vector, budget)?;
        let inner = self.inner.read();

        let arr = Array1::from_vec(inner.prepare(vector)?);
        let query_view = arr.view();

        let mut results: Vec<QueryResult<E>> = candidates
            .iter()
            .filter_map(|&id| {
                inner.vectors.get(&id).map(|stored| QueryResult {
                    id,
                    distance: inner
                        .config
                        .distance_metric
                        .compute(&query_view, &stored.view()),
                })
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }

    // ------------------------------------------------------------------
    // Stats / metrics
    // ------------------------------------------------------------------

    /// Number of stored vectors (duplicate IDs counted once).
    pub fn len(&self) -> usize {
        self.inner.read().vectors.len()
    }

    /// True when the engine holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.inner.read().vectors.is_empty()
    }

    /// Compute aggregate statistics about the engine.
    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read();
        let tables = inner.index.tables();

        let total_buckets: usize = tables.iter().map(|t| t.bucket_count()).sum();
        let total_entries: usize = tables.iter().map(|t| t.len()).sum();
        let max_bucket_size = tables.iter().map(|t| t.max_bucket_size()).max().unwrap_or(0);
        let avg_bucket_size = if total_buckets > 0 {
            total_entries as f64 / total_buckets as f64
        } else {
            0.0
        };

        IndexStats {
            num_vectors: inner.vectors.len(),
            num_tables: inner.config.num_tables,
            num_partitions: inner.config.num_partitions,
            bits: inner.config.bits,
            dimension: inner.config.dim,
            total_buckets,
            avg_bucket_size,
            max_bucket_size,
        }
    }

    /// Snapshot of runtime metrics (`None` if metrics were not enabled).
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }

    /// Return a clone of the current configuration.
    pub fn config(&self) -> ProbeConfig {
        self.inner.read().config.clone()
    }
}

impl<E: Element> ProbeInner<E> {
    /// Validate length and apply the configured normalization.
    fn prepare(&self, vector: &[E]) -> Result<Vec<E>> {
        if vector.len() != self.config.dim {
            return Err(LshError::DimensionMismatch {
                expected: self.config.dim,
                got: vector.len(),
            });
        }
        let mut arr = Array1::from_vec(vector.to_vec());
        if self.config.normalize_vectors {
            distance::normalize(&mut arr);
        }
        Ok(arr.into_raw_vec())
    }
}

// ---------------------------------------------------------------------------
// Parallel batch ops (behind `parallel` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "parallel")]
impl<E: Element> MultiProbeEngine<E> {
    /// Query multiple vectors in parallel.
    pub fn par_query_batch(
        &self,
        queries: &[Vec<E>],
        budget: usize,
    ) -> Result<Vec<Vec<usize>>> {
        use rayon::prelude::*;

        queries.par_iter().map(|q| self.query(q, budget)).collect()
    }

    /// Rank multiple queries in parallel.
    pub fn par_k_probe_batch(
        &self,
        k: usize,
        queries: &[Vec<E>],
        budget: usize,
    ) -> Result<Vec<Vec<QueryResult<E>>>> {
        use rayon::prelude::*;

        queries
            .par_iter()
            .map(|q| self.k_probe(k, q, budget))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`MultiProbeEngine`].
#[derive(Default)]
pub struct MultiProbeEngineBuilder {
    config: ProbeConfig,
    enable_metrics: bool,
}

impl MultiProbeEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dim(mut self, dim: usize) -> Self {
        self.config.dim = dim;
        self
    }

    pub fn bits(mut self, bits: usize) -> Self {
        self.config.bits = bits;
        self
    }

    pub fn num_tables(mut self, n: usize) -> Self {
        self.config.num_tables = n;
        self
    }

    pub fn num_partitions(mut self, n: usize) -> Self {
        self.config.num_partitions = n;
        self
    }

    pub fn num_buckets(mut self, n: usize) -> Self {
        self.config.num_buckets = n;
        self
    }

    pub fn distance_metric(mut self, m: DistanceMetric) -> Self {
        self.config.distance_metric = m;
        self
    }

    pub fn normalize(mut self, yes: bool) -> Self {
        self.config.normalize_vectors = yes;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn enable_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Build the engine, returning an error on invalid configuration.
    pub fn build<E: Element>(self) -> Result<MultiProbeEngine<E>> {
        MultiProbeEngine::new_with_metrics(self.config, self.enable_metrics)
    }
}
