use ndarray::{Array1, ArrayView1};

use crate::element::Element;

/// Distance metric used when re-ranking probe candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum DistanceMetric {
    /// Cosine distance: 1 - cos(a, b). Range [0, 2]. 0 = identical direction.
    Cosine,
    /// Euclidean (L2) distance. Range [0, inf).
    Euclidean,
    /// Negative dot product (so smaller = more similar). Range (-inf, inf).
    DotProduct,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric.
    pub fn compute<E: Element>(&self, a: &ArrayView1<E>, b: &ArrayView1<E>) -> E {
        match self {
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::DotProduct => E::ZERO - a.dot(b),
        }
    }
}

/// Cosine distance: 1 - cos(a, b). Returns 1 when either norm vanishes.
pub fn cosine_distance<E: Element>(a: &ArrayView1<E>, b: &ArrayView1<E>) -> E {
    let dot = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    let denom = norm_a * norm_b;
    if denom <= E::ZERO {
        return E::ONE;
    }
    E::ONE - dot / denom
}

/// Euclidean (L2) distance between two vectors.
pub fn euclidean_distance<E: Element>(a: &ArrayView1<E>, b: &ArrayView1<E>) -> E {
    a.iter()
        .zip(b.iter())
        .fold(E::ZERO, |acc, (&x, &y)| {
            let d = x - y;
            acc + d * d
        })
        .sqrt()
}

/// Normalize a vector to unit length (L2 norm). Leaves zero vectors unchanged.
pub fn normalize<E: Element>(v: &mut Array1<E>) {
    let norm = v.dot(v).sqrt();
    if norm > E::ZERO {
        *v /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cosine_identical() {
        let a = array![1.0_f32, 0.0, 0.0];
        let d = cosine_distance(&a.view(), &a.view());
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = array![1.0_f64, 0.0];
        let b = array![0.0_f64, 1.0];
        let d = cosine_distance(&a.view(), &b.view());
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_euclidean() {
        let a = array![0.0_f32, 0.0];
        let b = array![3.0_f32, 4.0];
        let d = euclidean_distance(&a.view(), &b.view());
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_product_metric_orders_by_similarity() {
        let q = array![1.0_f32, 0.0];
        let close = array![0.9_f32, 0.1];
        let far = array![0.1_f32, 0.9];
        let m = DistanceMetric::DotProduct;
        assert!(m.compute(&q.view(), &close.view()) < m.compute(&q.view(), &far.view()));
    }

    #[test]
    fn test_normalize() {
        let mut v = array![3.0_f32, 4.0];
        normalize(&mut v);
        assert!((v.dot(&v).sqrt() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = array![0.0_f64, 0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, array![0.0, 0.0, 0.0]);
    }

    // In-place division on Array1<E> must work for any Element, not just a
    // concrete float width.
    fn unit_norm<E: Element>(mut v: Array1<E>) -> Array1<E> {
        normalize(&mut v);
        v
    }

    #[test]
    fn test_normalize_generic_over_both_widths() {
        let v32 = unit_norm(array![3.0_f32, 4.0]);
        assert!((v32.dot(&v32).sqrt() - 1.0).abs() < 1e-6);
        let v64 = unit_norm(array![1.0_f64, 2.0, 2.0]);
        assert!((v64.dot(&v64).sqrt() - 1.0).abs() < 1e-12);
    }
}
