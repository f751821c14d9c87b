//! Additive attention pooling
//!
//! ```text
//! s_t = tanh(H_t · Wa) · u
//! α   = softmax(s)
//! c   = Σ_t α_t H_t
//! ```

use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::math::{glorot_uniform, glorot_vector, outer, softmax};

/// Attention parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionWeights {
    /// Projection (D × A)
    pub w: Array2<f64>,
    /// Context vector (A)
    pub u: Array1<f64>,
}

/// Forward activations kept for the backward pass
#[derive(Debug, Clone)]
pub struct AttentionCache {
    projected: Array2<f64>,
    pub weights: Array1<f64>,
}

impl AttentionWeights {
    pub fn new<R: Rng>(dim: usize, units: usize, rng: &mut R) -> Self {
        Self {
            w: glorot_uniform(dim, units, rng),
            u: glorot_vector(units, rng),
        }
    }

    pub fn zeros_like(other: &Self) -> Self {
        Self {
            w: Array2::zeros(other.w.raw_dim()),
            u: Array1::zeros(other.u.raw_dim()),
        }
    }

    /// Pool T×D states into a D context vector
    pub fn forward(&self, states: ArrayView2<'_, f64>) -> (Array1<f64>, AttentionCache) {
        let projected = states.dot(&self.w).mapv(f64::tanh);
        let scores = projected.dot(&self.u);
        let weights = softmax(scores.view());
        let context = weights.dot(&states);

        (context, AttentionCache { projected, weights })
    }

    /// Backpropagate dL/dc into `grads`. Returns dL/dH (T×D).
    pub fn backward(
        &self,
        states: ArrayView2<'_, f64>,
        cache: &AttentionCache,
        d_context: &Array1<f64>,
        grads: &mut AttentionWeights,
    ) -> Array2<f64> {
        let alpha = &cache.weights;

        // Through the weighted sum
        let d_alpha = states.dot(d_context);
        let mut d_states = outer(alpha.view(), d_context.view());

        // Through the softmax
        let mean = alpha.dot(&d_alpha);
        let d_scores = alpha * &(d_alpha - mean);

        // Through the scoring MLP
        grads.u += &cache.projected.t().dot(&d_scores);
        let d_projected = outer(d_scores.view(), self.u.view());
        let d_pre = d_projected * &cache.projected.mapv(|v| 1.0 - v * v);
        grads.w += &states.t().dot(&d_pre);
        d_states += &d_pre.dot(&self.w.t());

        d_states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weights_form_distribution() {
        let mut rng = StdRng::seed_from_u64(3);
        let attention = AttentionWeights::new(6, 6, &mut rng);
        let states = Array2::from_shape_fn((20, 6), |(i, j)| ((i * 7 + j) % 5) as f64 - 2.0);

        let (context, cache) = attention.forward(states.view());

        assert_eq!(context.len(), 6);
        assert!(cache.weights.iter().all(|w| *w >= 0.0));
        assert!((cache.weights.sum() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_identical_states_pool_to_same_state() {
        let mut rng = StdRng::seed_from_u64(4);
        let attention = AttentionWeights::new(3, 3, &mut rng);
        let states = Array2::from_shape_fn((4, 3), |(_, j)| j as f64);

        let (context, cache) = attention.forward(states.view());

        assert!(cache.weights.iter().all(|w| (w - 0.25).abs() < 1e-12));
        for (j, c) in context.iter().enumerate() {
            assert!((c - j as f64).abs() < 1e-12);
        }
    }
}
