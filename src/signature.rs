use std::fmt;

use crate::error::{LshError, Result};

/// Widest signature the engine supports (one machine word of bits).
pub const MAX_BITS: usize = 64;

/// A fixed-width bit signature produced by a hash family.
///
/// The bit pattern lives in a single `u64`; `width` says how many of the low
/// bits are meaningful. Two signatures are comparable by Hamming distance
/// only when their widths match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Signature {
    key: u64,
    width: usize,
}

impl Signature {
    /// Wrap a raw key as a `width`-bit signature.
    ///
    /// Fails with `InvalidParameter` when `width` is 0 or above [`MAX_BITS`],
    /// and with `DimensionMismatch` when `key` has bits set above `width`.
    pub fn new(key: u64, width: usize) -> Result<Self> {
        if width == 0 || width > MAX_BITS {
            return Err(LshError::InvalidParameter(format!(
                "signature width must be in 1..={MAX_BITS}, got {width}"
            )));
        }
        if key & !mask_for(width) != 0 {
            return Err(LshError::DimensionMismatch {
                expected: width,
                got: MAX_BITS - key.leading_zeros() as usize,
            });
        }
        Ok(Self { key, width })
    }

    /// All-zero signature of the given width. Width must already be valid.
    pub(crate) fn zero(width: usize) -> Self {
        Self { key: 0, width }
    }

    pub(crate) fn set_bit(&mut self, bit: usize) {
        debug_assert!(bit < self.width);
        self.key |= 1 << bit;
    }

    /// The raw bit pattern.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Number of meaningful bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Hamming distance to another signature of the same width.
    pub fn hamming(&self, other: &Signature) -> Result<u32> {
        if self.width != other.width {
            return Err(LshError::DimensionMismatch {
                expected: self.width,
                got: other.width,
            });
        }
        Ok((self.key ^ other.key).count_ones())
    }

    /// Signature with the given bits flipped. The mask must stay within
    /// the signature width; callers build masks from in-range bit indices.
    pub(crate) fn flipped(&self, flip_mask: u64) -> Self {
        debug_assert_eq!(flip_mask & !mask_for(self.width), 0);
        Self {
            key: self.key ^ flip_mask,
            width: self.width,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$b}", self.key, width = self.width)
    }
}

/// Bit mask covering the low `width` bits.
pub(crate) fn mask_for(width: usize) -> u64 {
    if width >= MAX_BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
