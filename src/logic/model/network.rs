//! Attention-Pooled Classifier - BiGRU encoder + additive attention + dense head
//!
//! ```text
//! W×F ──BiGRU──▶ H (W×2H) ──attention──▶ c (2H) ──dense+ReLU──▶ dropout ──dense──▶ σ
//! ```
//!
//! State machine: Untrained → Trained → Serving. Predicting with an
//! untrained model and training a serving model are errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;
use ndarray::{s, Array1, Array2, ArrayView2, ArrayViewD, ArrayViewMutD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DECISION_THRESHOLD, PROBABILITY_EPS};
use crate::logic::config::ModelConfig;
use crate::logic::error::{CoreError, CoreResult};
use super::attention::{AttentionCache, AttentionWeights};
use super::gru::{concat_directions, reverse_rows, GruCache, GruWeights};
use super::math::{glorot_uniform, glorot_vector, outer, sigmoid};
use super::window::{Prediction, Sequence};

// ============================================================================
// WEIGHTS
// ============================================================================

/// Dense classification head
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadWeights {
    /// Hidden kernel (2H × dense)
    pub w1: Array2<f64>,
    pub b1: Array1<f64>,
    /// Output kernel (dense)
    pub w2: Array1<f64>,
    /// Output bias (1)
    pub b2: Array1<f64>,
}

/// All trainable parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWeights {
    pub forward: GruWeights,
    pub backward: GruWeights,
    pub attention: AttentionWeights,
    pub head: HeadWeights,
}

impl NetworkWeights {
    pub fn new<R: Rng>(input_dim: usize, config: &ModelConfig, rng: &mut R) -> Self {
        let d = 2 * config.hidden_units;
        Self {
            forward: GruWeights::new(input_dim, config.hidden_units, rng),
            backward: GruWeights::new(input_dim, config.hidden_units, rng),
            attention: AttentionWeights::new(d, d, rng),
            head: HeadWeights {
                w1: glorot_uniform(d, config.dense_units, rng),
                b1: Array1::zeros(config.dense_units),
                w2: glorot_vector(config.dense_units, rng),
                b2: Array1::zeros(1),
            },
        }
    }

    /// Zero-filled weights of the same shapes (gradients, optimizer moments)
    pub fn zeros_like(other: &Self) -> Self {
        Self {
            forward: GruWeights::zeros_like(&other.forward),
            backward: GruWeights::zeros_like(&other.backward),
            attention: AttentionWeights::zeros_like(&other.attention),
            head: HeadWeights {
                w1: Array2::zeros(other.head.w1.raw_dim()),
                b1: Array1::zeros(other.head.b1.raw_dim()),
                w2: Array1::zeros(other.head.w2.raw_dim()),
                b2: Array1::zeros(other.head.b2.raw_dim()),
            },
        }
    }

    /// Every parameter tensor, in a fixed order
    pub fn tensors(&self) -> Vec<ArrayViewD<'_, f64>> {
        vec![
            self.forward.w.view().into_dyn(),
            self.forward.u.view().into_dyn(),
            self.forward.b.view().into_dyn(),
            self.backward.w.view().into_dyn(),
            self.backward.u.view().into_dyn(),
            self.backward.b.view().into_dyn(),
            self.attention.w.view().into_dyn(),
            self.attention.u.view().into_dyn(),
            self.head.w1.view().into_dyn(),
            self.head.b1.view().into_dyn(),
            self.head.w2.view().into_dyn(),
            self.head.b2.view().into_dyn(),
        ]
    }

    /// Mutable counterpart of `tensors`, same order
    pub fn tensors_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        vec![
            self.forward.w.view_mut().into_dyn(),
            self.forward.u.view_mut().into_dyn(),
            self.forward.b.view_mut().into_dyn(),
            self.backward.w.view_mut().into_dyn(),
            self.backward.u.view_mut().into_dyn(),
            self.backward.b.view_mut().into_dyn(),
            self.attention.w.view_mut().into_dyn(),
            self.attention.u.view_mut().into_dyn(),
            self.head.w1.view_mut().into_dyn(),
            self.head.b1.view_mut().into_dyn(),
            self.head.w2.view_mut().into_dyn(),
            self.head.b2.view_mut().into_dyn(),
        ]
    }

    pub fn parameter_count(&self) -> usize {
        self.tensors().iter().map(|t| t.len()).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.tensors().iter().all(|t| t.iter().all(|v| v.is_finite()))
    }

    pub fn input_dim(&self) -> usize {
        self.forward.input_dim()
    }
}

// ============================================================================
// FORWARD CACHE
// ============================================================================

/// Activations of one forward pass
pub(crate) struct ForwardPass {
    x_reversed: Array2<f64>,
    forward_cache: GruCache,
    backward_cache: GruCache,
    states: Array2<f64>,
    attention: AttentionCache,
    context: Array1<f64>,
    hidden_pre: Array1<f64>,
    hidden: Array1<f64>,
    mask: Array1<f64>,
    logit: f64,
}

impl ForwardPass {
    pub(crate) fn probability(&self) -> f64 {
        sigmoid(self.logit)
    }

    pub(crate) fn attention_weights(&self) -> &Array1<f64> {
        &self.attention.weights
    }
}

/// Clamp into the open unit interval
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_EPS, 1.0 - PROBABILITY_EPS)
}

// ============================================================================
// MODEL STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelState {
    Untrained,
    Trained,
    Serving,
}

/// Model status for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub state: ModelState,
    pub window: usize,
    pub input_dim: usize,
    pub parameter_count: usize,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
}

/// Aggregate over a batch of windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub sequence_count: usize,
    pub positive_count: usize,
    pub mean_probability: f64,
}

impl BatchSummary {
    pub fn from_predictions(predictions: &[Prediction]) -> Self {
        if predictions.is_empty() {
            return Self::default();
        }
        let positives = predictions.iter().filter(|p| p.label == 1).count();
        let mean = predictions.iter().map(|p| p.probability).sum::<f64>() / predictions.len() as f64;
        Self {
            sequence_count: predictions.len(),
            positive_count: positives,
            mean_probability: mean,
        }
    }

    /// Combine summaries of consecutive chunks
    pub fn merge(&self, other: &BatchSummary) -> BatchSummary {
        let count = self.sequence_count + other.sequence_count;
        if count == 0 {
            return BatchSummary::default();
        }
        BatchSummary {
            sequence_count: count,
            positive_count: self.positive_count + other.positive_count,
            mean_probability: (self.mean_probability * self.sequence_count as f64
                + other.mean_probability * other.sequence_count as f64)
                / count as f64,
        }
    }
}

// ============================================================================
// PERSISTED MODEL
// ============================================================================

/// Serialized model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Layout hash of the schema the model was trained on
    pub layout_hash: u32,
    pub window: usize,
    pub threshold: f64,
    pub config: ModelConfig,
    pub weights: NetworkWeights,
    pub trained_at: i64, // Unix timestamp
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// BiGRU + attention sequence classifier
#[derive(Debug)]
pub struct AttentionPooledClassifier {
    config: ModelConfig,
    window: usize,
    threshold: f64,
    weights: NetworkWeights,
    state: ModelState,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl AttentionPooledClassifier {
    /// Fresh untrained model with seeded Glorot init
    pub fn new(input_dim: usize, window: usize, config: ModelConfig, seed: u64) -> CoreResult<Self> {
        config.validate()?;
        if input_dim == 0 || window == 0 {
            return Err(CoreError::InvalidConfig("input_dim and window must be > 0".into()));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let weights = NetworkWeights::new(input_dim, &config, &mut rng);

        log::info!(
            "Initialized attention classifier: window={}, input_dim={}, hidden={}, params={}",
            window,
            input_dim,
            config.hidden_units,
            weights.parameter_count()
        );

        Ok(Self {
            config,
            window,
            threshold: DEFAULT_DECISION_THRESHOLD,
            weights,
            state: ModelState::Untrained,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn input_dim(&self) -> usize {
        self.weights.input_dim()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn weights(&self) -> &NetworkWeights {
        &self.weights
    }

    /// Mutable weights for training. Serving models are frozen.
    pub(crate) fn weights_for_training(&mut self) -> CoreResult<&mut NetworkWeights> {
        if self.state == ModelState::Serving {
            return Err(CoreError::ModelFrozen);
        }
        Ok(&mut self.weights)
    }

    pub(crate) fn mark_trained(&mut self) {
        self.state = ModelState::Trained;
    }

    /// Freeze for serving
    pub fn freeze(&mut self) -> CoreResult<()> {
        match self.state {
            ModelState::Untrained => Err(CoreError::ModelNotTrained),
            _ => {
                self.state = ModelState::Serving;
                Ok(())
            }
        }
    }

    fn check_input(&self, x: &ArrayView2<'_, f64>) -> CoreResult<()> {
        if x.nrows() != self.window {
            return Err(CoreError::shape("sequence rows", self.window, x.nrows()));
        }
        if x.ncols() != self.input_dim() {
            return Err(CoreError::shape("sequence features", self.input_dim(), x.ncols()));
        }
        Ok(())
    }

    fn check_ready(&self) -> CoreResult<()> {
        if self.state == ModelState::Untrained {
            return Err(CoreError::ModelNotTrained);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Forward / backward
    // ------------------------------------------------------------------------

    /// Forward pass. `dropout_rng` enables train-time dropout.
    pub(crate) fn forward_pass(
        &self,
        x: ArrayView2<'_, f64>,
        dropout_rng: Option<&mut StdRng>,
    ) -> ForwardPass {
        let w = &self.weights;

        let (h_forward, forward_cache) = w.forward.forward(x);
        let x_reversed = reverse_rows(x);
        let (h_backward, backward_cache) = w.backward.forward(x_reversed.view());
        let states = concat_directions(&h_forward, &h_backward);

        let (context, attention) = w.attention.forward(states.view());

        let hidden_pre = context.dot(&w.head.w1) + &w.head.b1;
        let hidden = hidden_pre.mapv(|v| v.max(0.0));

        // Inverted dropout
        let rate = self.config.dropout;
        let mask = match dropout_rng {
            Some(rng) if rate > 0.0 => {
                let keep = 1.0 - rate;
                Array1::from_shape_simple_fn(hidden.len(), || {
                    if rng.gen::<f64>() < keep {
                        1.0 / keep
                    } else {
                        0.0
                    }
                })
            }
            _ => Array1::ones(hidden.len()),
        };

        let logit = (&hidden * &mask).dot(&w.head.w2) + w.head.b2[0];

        ForwardPass {
            x_reversed,
            forward_cache,
            backward_cache,
            states,
            attention,
            context,
            hidden_pre,
            hidden,
            mask,
            logit,
        }
    }

    /// Accumulate dL/dθ for one sample into `grads`, scaled by `weight`.
    /// Returns the sample's binary cross-entropy.
    pub(crate) fn backward_pass(
        &self,
        x: ArrayView2<'_, f64>,
        pass: &ForwardPass,
        target: f64,
        weight: f64,
        grads: &mut NetworkWeights,
    ) -> f64 {
        let w = &self.weights;
        let h = self.config.hidden_units;

        let p = pass.probability();
        let pc = clamp_probability(p);
        let loss = -(target * pc.ln() + (1.0 - target) * (1.0 - pc).ln());

        // d(BCE)/d(logit)
        let d_logit = (p - target) * weight;

        // Head
        let dropped = &pass.hidden * &pass.mask;
        grads.head.w2.scaled_add(d_logit, &dropped);
        grads.head.b2[0] += d_logit;
        let d_hidden = (&w.head.w2 * d_logit) * &pass.mask;
        let d_pre = d_hidden * &pass.hidden_pre.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        grads.head.w1 += &outer(pass.context.view(), d_pre.view());
        grads.head.b1 += &d_pre;
        let d_context = w.head.w1.dot(&d_pre);

        // Attention
        let d_states = w.attention.backward(pass.states.view(), &pass.attention, &d_context, &mut grads.attention);

        // Directions; the backward GRU ran over reversed time
        let d_forward = d_states.slice(s![.., ..h]);
        let d_backward = d_states.slice(s![..;-1, h..]);
        w.forward.backward(x, &pass.forward_cache, d_forward, &mut grads.forward);
        w.backward.backward(
            pass.x_reversed.view(),
            &pass.backward_cache,
            d_backward,
            &mut grads.backward,
        );

        loss
    }

    /// Loss and full gradient for one labelled window (no dropout)
    pub fn loss_and_gradients(&self, x: ArrayView2<'_, f64>, target: f64) -> CoreResult<(f64, NetworkWeights)> {
        self.check_input(&x)?;
        let pass = self.forward_pass(x, None);
        let mut grads = NetworkWeights::zeros_like(&self.weights);
        let loss = self.backward_pass(x, &pass, target, 1.0, &mut grads);
        Ok((loss, grads))
    }

    /// Raw probability without state checks or stats (training/evaluation)
    pub(crate) fn probability_unchecked(&self, x: ArrayView2<'_, f64>) -> f64 {
        clamp_probability(self.forward_pass(x, None).probability())
    }

    // ------------------------------------------------------------------------
    // Inference
    // ------------------------------------------------------------------------

    /// Probability and label for one W×F window
    pub fn predict_window(&self, x: ArrayView2<'_, f64>) -> CoreResult<Prediction> {
        self.check_ready()?;
        self.check_input(&x)?;

        let start = Instant::now();
        let probability = self.probability_unchecked(x);
        let elapsed = start.elapsed().as_micros() as u64;

        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(Prediction {
            probability,
            label: u8::from(probability > self.threshold),
        })
    }

    /// Predict a single sequence
    pub fn predict(&self, sequence: &Sequence) -> CoreResult<Prediction> {
        self.predict_window(sequence.data())
    }

    /// Predict a batch in minibatches of `batch_size`
    pub fn predict_batch(
        &self,
        sequences: &[Sequence],
        batch_size: usize,
    ) -> CoreResult<(Vec<Prediction>, BatchSummary)> {
        self.check_ready()?;
        let batch_size = batch_size.max(1);

        let mut predictions = Vec::with_capacity(sequences.len());
        for (i, batch) in sequences.chunks(batch_size).enumerate() {
            for sequence in batch {
                predictions.push(self.predict(sequence)?);
            }
            log::trace!("Minibatch {} done ({} windows)", i, batch.len());
        }

        let summary = BatchSummary::from_predictions(&predictions);
        log::debug!(
            "Predicted {} windows, {} positive, mean p={:.4}",
            summary.sequence_count,
            summary.positive_count,
            summary.mean_probability
        );
        Ok((predictions, summary))
    }

    /// Attention distribution over the W timesteps of a window
    pub fn attention_weights(&self, x: ArrayView2<'_, f64>) -> CoreResult<Array1<f64>> {
        self.check_ready()?;
        self.check_input(&x)?;
        Ok(self.forward_pass(x, None).attention_weights().clone())
    }

    pub fn status(&self) -> ModelStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        ModelStatus {
            state: self.state,
            window: self.window,
            input_dim: self.input_dim(),
            parameter_count: self.weights.parameter_count(),
            avg_latency_ms: avg,
            inference_count: count,
        }
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Snapshot for persistence, bound to a schema layout
    pub fn to_artifact(&self, layout_hash: u32) -> CoreResult<ModelArtifact> {
        self.check_ready()?;
        Ok(ModelArtifact {
            layout_hash,
            window: self.window,
            threshold: self.threshold,
            config: self.config.clone(),
            weights: self.weights.clone(),
            trained_at: Utc::now().timestamp(),
        })
    }

    /// Restore a persisted model directly into Serving
    pub fn from_artifact(artifact: ModelArtifact) -> CoreResult<Self> {
        validate_artifact(&artifact)?;

        log::info!(
            "Loaded attention classifier: window={}, input_dim={}, params={}",
            artifact.window,
            artifact.weights.input_dim(),
            artifact.weights.parameter_count()
        );

        Ok(Self {
            config: artifact.config,
            window: artifact.window,
            threshold: artifact.threshold,
            weights: artifact.weights,
            state: ModelState::Serving,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        })
    }
}

/// Reject artifacts whose shapes disagree with their config or hold non-finite weights
pub fn validate_artifact(artifact: &ModelArtifact) -> CoreResult<()> {
    artifact.config.validate()?;
    if artifact.window == 0 {
        return Err(CoreError::contract_missing("model", "window is 0"));
    }
    if !(artifact.threshold > 0.0 && artifact.threshold < 1.0) {
        return Err(CoreError::contract_missing("model", "threshold outside (0, 1)"));
    }

    let w = &artifact.weights;
    let h = artifact.config.hidden_units;
    let d = 2 * h;
    let dense = artifact.config.dense_units;
    let f = w.input_dim();

    let expected = [
        (w.forward.w.dim(), (f, 3 * h)),
        (w.forward.u.dim(), (h, 3 * h)),
        (w.backward.w.dim(), (f, 3 * h)),
        (w.backward.u.dim(), (h, 3 * h)),
        (w.attention.w.dim(), (d, d)),
        (w.head.w1.dim(), (d, dense)),
    ];
    for (actual, wanted) in expected {
        if actual != wanted {
            return Err(CoreError::contract_missing(
                "model",
                format!("weight shape {:?}, expected {:?}", actual, wanted),
            ));
        }
    }

    let vectors = [
        (w.forward.b.len(), 3 * h),
        (w.backward.b.len(), 3 * h),
        (w.attention.u.len(), d),
        (w.head.b1.len(), dense),
        (w.head.w2.len(), dense),
        (w.head.b2.len(), 1),
    ];
    for (actual, wanted) in vectors {
        if actual != wanted {
            return Err(CoreError::contract_missing(
                "model",
                format!("bias length {}, expected {}", actual, wanted),
            ));
        }
    }

    if !w.is_finite() {
        return Err(CoreError::contract_missing("model", "non-finite weights"));
    }

    Ok(())
}
