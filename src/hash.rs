use log::debug;
use ndarray::{Array1, ArrayView1};
use rand::Rng;

use crate::element::Element;
use crate::error::{LshError, Result};
use crate::signature::{Signature, MAX_BITS};

/// A random-projection hash family mapping vectors to bit signatures.
///
/// Each of the `bits` signature positions is the sign of the dot product
/// with one Gaussian projection vector: 1 for a non-negative product, 0 for
/// a negative one (a zero projection ties toward 1, consistently).
///
/// Projections are drawn once from the RNG handed to the constructor and
/// never mutated afterwards, so a family is safe to share across any number
/// of concurrent readers and seeded families hash reproducibly.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct HashFamily<E: Element> {
    projections: Vec<Array1<E>>,
    bits: usize,
    dim: usize,
    norm_append: bool,
}

impl<E: Element> HashFamily<E> {
    /// Plain sign-of-random-projection family (SimHash / hyperplane LSH).
    pub fn new<R: Rng + ?Sized>(bits: usize, dim: usize, rng: &mut R) -> Result<Self> {
        Self::build(bits, dim, false, rng)
    }

    /// SimpleLSH construction for maximum-inner-product / cosine search.
    ///
    /// Before projecting, the input gains one extra coordinate equal to
    /// `sqrt(max(0, 1 - ||v||^2))`, lifting it onto the unit sphere of
    /// dimension `dim + 1`. The norm bound is fixed at 1: callers scale
    /// their data so every vector has norm at most 1 (queries are usually
    /// normalized to exactly 1).
    pub fn simple_lsh<R: Rng + ?Sized>(bits: usize, dim: usize, rng: &mut R) -> Result<Self> {
        Self::build(bits, dim, true, rng)
    }

    fn build<R: Rng + ?Sized>(
        bits: usize,
        dim: usize,
        norm_append: bool,
        rng: &mut R,
    ) -> Result<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(LshError::InvalidParameter(format!(
                "bits must be in 1..={MAX_BITS}, got {bits}"
            )));
        }
        if dim == 0 {
            return Err(LshError::InvalidParameter(
                "dim must be greater than 0".into(),
            ));
        }

        let proj_dim = if norm_append { dim + 1 } else { dim };
        let projections = (0..bits)
            .map(|_| {
                let v: Vec<E> = (0..proj_dim).map(|_| E::sample_normal(rng)).collect();
                Array1::from_vec(v)
            })
            .collect();

        debug!("built hash family: bits={bits} dim={dim} norm_append={norm_append}");

        Ok(Self {
            projections,
            bits,
            dim,
            norm_append,
        })
    }

    /// Compute the signature of a vector.
    ///
    /// Deterministic for a fixed family; fails with `DimensionMismatch`
    /// when the vector length differs from the family's `dim`.
    pub fn signature(&self, vector: &[E]) -> Result<Signature> {
        if vector.len() != self.dim {
            return Err(LshError::DimensionMismatch {
                expected: self.dim,
                got: vector.len(),
            });
        }

        let mut sig = Signature::zero(self.bits);

        if self.norm_append {
            let lifted = self.lift(vector);
            let view = lifted.view();
            for (i, proj) in self.projections.iter().enumerate() {
                if view.dot(proj) >= E::ZERO {
                    sig.set_bit(i);
                }
            }
        } else {
            let view = ArrayView1::from(vector);
            for (i, proj) in self.projections.iter().enumerate() {
                if view.dot(proj) >= E::ZERO {
                    sig.set_bit(i);
                }
            }
        }

        Ok(sig)
    }

    /// Append the SimpleLSH coordinate `sqrt(max(0, 1 - ||v||^2))`.
    ///
    /// Vectors with norm above the bound get 0 appended rather than a NaN.
    fn lift(&self, vector: &[E]) -> Array1<E> {
        let sq_norm = vector.iter().fold(E::ZERO, |acc, &x| acc + x * x);
        let slack = E::ONE - sq_norm;
        let extra = if slack > E::ZERO {
            slack.sqrt()
        } else {
            E::ZERO
        };

        let mut lifted = Vec::with_capacity(self.dim + 1);
        lifted.extend_from_slice(vector);
        lifted.push(extra);
        Array1::from_vec(lifted)
    }

    /// Signature width in bits.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Expected input vector length.
    pub fn dim(&self) -> usize {
        self.dim
    }
}
