use std::fmt;
use std::ops::DivAssign;
use std::str::FromStr;

use ndarray::{LinalgScalar, ScalarOperand};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::LshError;

/// Floating-point element type the engine is instantiated over.
///
/// Sealed: only `f32` and `f64` are supported. Everything the hashing math
/// needs from the scalar lives here, so the rest of the crate stays fully
/// generic and both widths are compiled from the same source. `DivAssign`
/// is what lets `Array1<E> /= E` normalize vectors in place.
pub trait Element:
    LinalgScalar + ScalarOperand + DivAssign + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    const ZERO: Self;
    const ONE: Self;

    fn sqrt(self) -> Self;
    /// Draw one standard-normal sample for a projection coordinate.
    fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

impl Element for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn sqrt(self) -> Self {
        self.sqrt()
    }

    fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl Element for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn sqrt(self) -> Self {
        self.sqrt()
    }

    fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

/// Runtime tag naming a supported element width.
///
/// Used only at dispatch boundaries (e.g. the Python bindings) to pick an
/// instantiation; it carries no behavior of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    F32,
    F64,
}

impl FromStr for ElementType {
    type Err = LshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f32" | "float32" => Ok(ElementType::F32),
            "f64" | "float64" => Ok(ElementType::F64),
            other => Err(LshError::InvalidParameter(format!(
                "unsupported element type tag: {other:?} (expected \"float32\" or \"float64\")"
            ))),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::F32 => write!(f, "float32"),
            ElementType::F64 => write!(f, "float64"),
        }
    }
}
