//! Numeric helpers shared by the network layers

use ndarray::{Array1, Array2, ArrayView1};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

/// Softmax with max subtraction
pub fn softmax(scores: ArrayView1<'_, f64>) -> Array1<f64> {
    let max = scores.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    let exp = scores.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Glorot/Xavier uniform initialization
pub fn glorot_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    Array2::from_shape_simple_fn((rows, cols), || dist.sample(rng))
}

/// Uniform vector initialization with the same fan rule
pub fn glorot_vector<R: Rng>(len: usize, rng: &mut R) -> Array1<f64> {
    let limit = (6.0 / (len + 1) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    Array1::from_shape_simple_fn(len, || dist.sample(rng))
}

/// Outer product a ⊗ b
pub fn outer(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Array2<f64> {
    let a = a.insert_axis(ndarray::Axis(1));
    let b = b.insert_axis(ndarray::Axis(0));
    a.dot(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sigmoid_properties() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-10);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
        assert!(sigmoid(1000.0).is_finite());
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(array![1000.0, 1001.0, -5.0].view());
        assert!((p.sum() - 1.0).abs() < 1e-12);
        assert!(p.iter().all(|v| *v >= 0.0));
        assert!(p[1] > p[0]);
    }

    #[test]
    fn test_glorot_bounds_and_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let wa = glorot_uniform(4, 8, &mut a);
        let wb = glorot_uniform(4, 8, &mut b);

        let limit = (6.0f64 / 12.0).sqrt();
        assert_eq!(wa, wb);
        assert!(wa.iter().all(|v| v.abs() <= limit));
    }

    #[test]
    fn test_outer() {
        let o = outer(array![1.0, 2.0].view(), array![3.0, 4.0, 5.0].view());
        assert_eq!(o, array![[3.0, 4.0, 5.0], [6.0, 8.0, 10.0]]);
    }
}
