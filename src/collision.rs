//! Collision-probability math used to size tables before building them.
//!
//! Everything here is stateless: pure functions over signature keys, counts
//! and probabilities, consumed by callers to pick `bits` and `num_tables`
//! for a target retrieval guarantee.

use crate::error::{LshError, Result};
use crate::signature::{mask_for, MAX_BITS};

/// Recommended table shape for a dataset, from [`sizes_from_probs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSizes {
    /// Signature width per table.
    pub bits: usize,
    /// Number of independent tables.
    pub num_tables: usize,
}

/// Count the matching positions among the low `bits` of two signature keys.
///
/// Equivalently `bits - hamming(n1, n2)`. Fails with `InvalidParameter` when
/// `bits` is outside `1..=64`, and with `DimensionMismatch` when either key
/// carries set bits above `bits` (the keys are wider than claimed).
pub fn same_bits(n1: u64, n2: u64, bits: usize) -> Result<u32> {
    if bits == 0 || bits > MAX_BITS {
        return Err(LshError::InvalidParameter(format!(
            "bits must be in 1..={MAX_BITS}, got {bits}"
        )));
    }
    let mask = mask_for(bits);
    for key in [n1, n2] {
        if key & !mask != 0 {
            return Err(LshError::DimensionMismatch {
                expected: bits,
                got: MAX_BITS - key.leading_zeros() as usize,
            });
        }
    }
    Ok((!(n1 ^ n2) & mask).count_ones())
}

/// Recommend `(bits, num_tables)` from two per-bit collision probabilities.
///
/// `p1` is the probability one signature bit agrees for a near pair, `p2`
/// the same for an unrelated pair. The width is chosen so an unrelated pair
/// is expected to share a bucket at most once among `n_to_insert` items
/// (`p2^bits * n <= 1`), then enough tables are stacked for a near pair to
/// collide in at least one of them with constant probability
/// (`num_tables ~ (1/p1)^bits`).
pub fn sizes_from_probs(n_to_insert: usize, p1: f64, p2: f64) -> Result<TableSizes> {
    if n_to_insert == 0 {
        return Err(LshError::InvalidParameter(
            "n_to_insert must be greater than 0".into(),
        ));
    }
    if !(0.0..1.0).contains(&p1) || p1 == 0.0 || !(0.0..1.0).contains(&p2) || p2 == 0.0 {
        return Err(LshError::InvalidParameter(format!(
            "probabilities must lie in (0, 1), got p1={p1} p2={p2}"
        )));
    }
    if p2 >= p1 {
        return Err(LshError::InvalidParameter(format!(
            "p2 must be smaller than p1, got p1={p1} p2={p2}"
        )));
    }

    let bits_exact = (n_to_insert as f64).ln() / (1.0 / p2).ln();
    let bits = (bits_exact.ceil() as usize).clamp(1, MAX_BITS);

    let tables_exact = (1.0 / p1).powi(bits as i32);
    let num_tables = (tables_exact.ceil() as usize).clamp(1, 512);

    Ok(TableSizes { bits, num_tables })
}

/// Per-bit collision probability of hyperplane LSH for a pair at angle
/// `theta` radians: `1 - theta / pi`.
pub fn collision_probability(theta: f64) -> f64 {
    (1.0 - theta / std::f64::consts::PI).clamp(0.0, 1.0)
}

/// Estimate recall for a table shape given the per-bit agreement
/// probability `p_bit` of a relevant pair.
///
/// A pair shares one table's exact bucket with probability `p_bit^bits`;
/// each extra probe recovers roughly one single-bit disagreement, adding
/// about `p_bit^(bits-1) * (1 - p_bit)`. Tables OR together.
pub fn estimate_recall(p_bit: f64, bits: usize, num_tables: usize, num_probes: usize) -> f64 {
    let p_bit = p_bit.clamp(0.0, 1.0);
    let p_table = p_bit.powi(bits as i32);

    let p_probe_bonus = if bits > 1 {
        num_probes as f64 * p_bit.powi(bits as i32 - 1) * (1.0 - p_bit)
    } else {
        0.0
    };
    let p_effective = (p_table + p_probe_bonus).min(1.0);

    1.0 - (1.0 - p_effective).powi(num_tables as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bits_identity() {
        for bits in [1, 8, 32, 64] {
            let s = mask_for(bits) & 0xDEAD_BEEF_CAFE_F00D;
            assert_eq!(same_bits(s, s, bits).unwrap(), bits as u32);
        }
    }

    #[test]
    fn test_same_bits_plus_hamming_is_bits() {
        let n1 = 0b1011_0010u64;
        let n2 = 0b0011_1010u64;
        let bits = 8;
        let hamming = (n1 ^ n2).count_ones();
        assert_eq!(same_bits(n1, n2, bits).unwrap() + hamming, bits as u32);
    }

    #[test]
    fn test_same_bits_rejects_wide_keys() {
        let err = same_bits(0b1_0000, 0, 4).unwrap_err();
        assert!(matches!(err, LshError::DimensionMismatch { expected: 4, .. }));
    }

    #[test]
    fn test_same_bits_rejects_bad_width() {
        assert!(matches!(
            same_bits(0, 0, 0),
            Err(LshError::InvalidParameter(_))
        ));
        assert!(matches!(
            same_bits(0, 0, 65),
            Err(LshError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_sizes_rejects_bad_probs() {
        assert!(sizes_from_probs(0, 0.9, 0.1).is_err());
        assert!(sizes_from_probs(100, 1.0, 0.1).is_err());
        assert!(sizes_from_probs(100, 0.9, 0.0).is_err());
        // p2 >= p1 is a contradiction: unrelated pairs colliding more often
        // than near ones.
        assert!(sizes_from_probs(100, 0.5, 0.5).is_err());
        assert!(sizes_from_probs(100, 0.3, 0.9).is_err());
    }

    #[test]
    fn test_sizes_grow_with_dataset() {
        let small = sizes_from_probs(100, 0.9, 0.01).unwrap();
        let large = sizes_from_probs(1000, 0.9, 0.01).unwrap();
        assert!(large.bits > small.bits);
    }

    #[test]
    fn test_sizes_monotone_in_n() {
        let mut prev = 0;
        for n in [1usize, 10, 100, 1_000, 10_000, 100_000, 1_000_000] {
            let sizes = sizes_from_probs(n, 0.9, 0.01).unwrap();
            assert!(sizes.bits >= prev, "bits shrank at n={n}");
            prev = sizes.bits;
        }
    }

    #[test]
    fn test_collision_probability_endpoints() {
        assert!((collision_probability(0.0) - 1.0).abs() < 1e-12);
        assert!(collision_probability(std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_recall_increases_with_tables() {
        let r4 = estimate_recall(0.8, 16, 4, 2);
        let r8 = estimate_recall(0.8, 16, 8, 2);
        assert!(r8 > r4);
    }

    #[test]
    fn test_estimate_recall_increases_with_probes() {
        let r0 = estimate_recall(0.8, 16, 4, 0);
        let r4 = estimate_recall(0.8, 16, 4, 4);
        assert!(r4 > r0);
    }
}
