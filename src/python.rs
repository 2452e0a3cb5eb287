//! Python bindings via PyO3.
//!
//! Requires the `python` feature flag. Build with [maturin](https://github.com/PyO3/maturin):
//!
//! ```sh
//! pip install maturin
//! maturin develop --features python
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::collision;
use crate::element::ElementType;
use crate::error::LshError;
use crate::probe::{MultiProbeEngine, ProbeConfig};

impl From<LshError> for PyErr {
    fn from(err: LshError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// One engine instantiation per supported element width; the `dtype` string
/// picks which one a Python caller gets.
enum AnyEngine {
    F32(MultiProbeEngine<f32>),
    F64(MultiProbeEngine<f64>),
}

/// Python-visible wrapper around [`MultiProbeEngine`].
#[pyclass(name = "MultiProbe")]
pub struct PyMultiProbe {
    inner: AnyEngine,
}

#[pymethods]
impl PyMultiProbe {
    /// Create a new multi-probe engine.
    ///
    /// Args:
    ///     num_tables: Number of independent hash tables.
    ///     num_partitions: Disjoint bit ranges probed independently.
    ///     bits: Signature width per table (1-64).
    ///     dim: Vector dimensionality.
    ///     num_buckets: Capacity hint for each table's bucket map.
    ///     dtype: "float32" or "float64".
    ///     seed: Optional RNG seed for reproducibility.
    #[new]
    #[pyo3(signature = (num_tables, num_partitions, bits, dim, num_buckets, dtype="float32", seed=None))]
    fn new(
        num_tables: usize,
        num_partitions: usize,
        bits: usize,
        dim: usize,
        num_buckets: usize,
        dtype: &str,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let config = ProbeConfig {
            dim,
            bits,
            num_tables,
            num_partitions,
            num_buckets,
            seed,
            ..ProbeConfig::default()
        };
        let inner = match dtype.parse::<ElementType>()? {
            ElementType::F32 => AnyEngine::F32(MultiProbeEngine::new(config)?),
            ElementType::F64 => AnyEngine::F64(MultiProbeEngine::new(config)?),
        };
        Ok(Self { inner })
    }

    /// Insert a vector with the given id.
    fn insert(&self, id: usize, vector: Vec<f64>) -> PyResult<()> {
        match &self.inner {
            AnyEngine::F32(e) => {
                let v: Vec<f32> = vector.into_iter().map(|x| x as f32).collect();
                e.insert(id, &v)?;
            }
            AnyEngine::F64(e) => e.insert(id, &vector)?,
        }
        Ok(())
    }

    /// Insert a batch of vectors; returns the assigned sequential ids.
    fn fill(&self, vectors: Vec<Vec<f64>>) -> PyResult<Vec<usize>> {
        let ids = match &self.inner {
            AnyEngine::F32(e) => {
                let vs: Vec<Vec<f32>> = vectors
                    .into_iter()
                    .map(|v| v.into_iter().map(|x| x as f32).collect())
                    .collect();
                e.fill(&vs)?
            }
            AnyEngine::F64(e) => e.fill(&vectors)?,
        };
        Ok(ids)
    }

    /// Candidate ids, probing up to `budget` buckets per table.
    fn query(&self, vector: Vec<f64>, budget: usize) -> PyResult<Vec<usize>> {
        let hits = match &self.inner {
            AnyEngine::F32(e) => {
                let v: Vec<f32> = vector.into_iter().map(|x| x as f32).collect();
                e.query(&v, budget)?
            }
            AnyEngine::F64(e) => e.query(&vector, budget)?,
        };
        Ok(hits)
    }

    /// Top-k candidates ranked by distance, as (id, distance) pairs.
    fn k_probe(&self, k: usize, vector: Vec<f64>, budget: usize) -> PyResult<Vec<(usize, f64)>> {
        let ranked = match &self.inner {
            AnyEngine::F32(e) => {
                let v: Vec<f32> = vector.into_iter().map(|x| x as f32).collect();
                e.k_probe(k, &v, budget)?
                    .into_iter()
                    .map(|r| (r.id, r.distance as f64))
                    .collect()
            }
            AnyEngine::F64(e) => e
                .k_probe(k, &vector, budget)?
                .into_iter()
                .map(|r| (r.id, r.distance))
                .collect(),
        };
        Ok(ranked)
    }

    fn __len__(&self) -> usize {
        match &self.inner {
            AnyEngine::F32(e) => e.len(),
            AnyEngine::F64(e) => e.len(),
        }
    }

    fn stats(&self) -> String {
        match &self.inner {
            AnyEngine::F32(e) => e.stats().to_string(),
            AnyEngine::F64(e) => e.stats().to_string(),
        }
    }
}

/// Count matching low-`bits` positions of two signature keys.
#[pyfunction]
fn same_bits(n1: u64, n2: u64, bits: usize) -> PyResult<u32> {
    Ok(collision::same_bits(n1, n2, bits)?)
}

/// Recommend `(bits, num_tables)` for a dataset; see the crate docs.
#[pyfunction]
fn sizes_from_probs(n_to_insert: usize, p1: f64, p2: f64) -> PyResult<(usize, usize)> {
    let sizes = collision::sizes_from_probs(n_to_insert, p1, p2)?;
    Ok((sizes.bits, sizes.num_tables))
}

#[pymodule]
fn multiprobe_lsh(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMultiProbe>()?;
    m.add_function(wrap_pyfunction!(same_bits, m)?)?;
    m.add_function(wrap_pyfunction!(sizes_from_probs, m)?)?;
    Ok(())
}
