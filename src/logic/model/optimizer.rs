//! Adam optimizer over `NetworkWeights`

use ndarray::Zip;

use crate::logic::config::TrainConfig;
use super::network::NetworkWeights;

/// Adam with bias-corrected first/second moments
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    m: NetworkWeights,
    v: NetworkWeights,
}

impl Adam {
    pub fn new(config: &TrainConfig, shape_of: &NetworkWeights) -> Self {
        Self {
            learning_rate: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
            step: 0,
            m: NetworkWeights::zeros_like(shape_of),
            v: NetworkWeights::zeros_like(shape_of),
        }
    }

    pub fn steps(&self) -> i32 {
        self.step
    }

    /// Apply one update from `grads`
    pub fn update(&mut self, weights: &mut NetworkWeights, grads: &NetworkWeights) {
        self.step += 1;

        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let lr_t = self.learning_rate * (1.0 - b2.powi(self.step)).sqrt() / (1.0 - b1.powi(self.step));

        let params = weights.tensors_mut();
        let grads = grads.tensors();
        let ms = self.m.tensors_mut();
        let vs = self.v.tensors_mut();

        for (((param, grad), m), v) in params.into_iter().zip(grads).zip(ms).zip(vs) {
            Zip::from(param)
                .and(&grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + eps);
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::ModelConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny() -> NetworkWeights {
        let config = ModelConfig {
            hidden_units: 2,
            dense_units: 3,
            dropout: 0.0,
        };
        NetworkWeights::new(2, &config, &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn test_first_step_moves_against_gradient() {
        let mut weights = tiny();
        let before = weights.clone();
        let mut grads = NetworkWeights::zeros_like(&weights);
        grads.head.b2[0] = 2.0;
        grads.head.w2.fill(-1.0);

        let mut adam = Adam::new(&TrainConfig::default(), &weights);
        adam.update(&mut weights, &grads);

        // First Adam step has magnitude ≈ lr in the sign of -g
        assert!((weights.head.b2[0] - (before.head.b2[0] - 1e-3)).abs() < 1e-6);
        for (after, prev) in weights.head.w2.iter().zip(before.head.w2.iter()) {
            assert!((after - (prev + 1e-3)).abs() < 1e-6);
        }
        // Zero gradient leaves parameters untouched
        assert_eq!(weights.forward.w, before.forward.w);
        assert_eq!(adam.steps(), 1);
    }
}
