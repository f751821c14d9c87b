//! Trainer - minibatch Adam on binary cross-entropy
//!
//! Fixed epoch budget, no early stopping. Accuracy and AUC are tracked per
//! epoch on the training windows (and on validation windows when given).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::logic::config::TrainConfig;
use crate::logic::error::{CoreError, CoreResult};
use super::metrics::{roc_auc, EvaluationReport};
use super::network::{AttentionPooledClassifier, NetworkWeights};
use super::optimizer::Adam;
use super::window::Sequence;

/// Metrics for one epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub auc: f64,
    pub validation: Option<EvaluationReport>,
}

/// Per-epoch training history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.loss).collect()
    }
}

/// Drives training of an `AttentionPooledClassifier`
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainConfig,
}

fn targets(sequences: &[Sequence]) -> CoreResult<Vec<f64>> {
    sequences
        .iter()
        .map(|s| {
            s.label()
                .ok_or_else(|| CoreError::UnsupportedInput("training sequence without label".into()))
        })
        .collect()
}

impl Trainer {
    pub fn new(config: TrainConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train in place. The model ends in `Trained`.
    pub fn fit(
        &self,
        model: &mut AttentionPooledClassifier,
        train: &[Sequence],
        validation: Option<&[Sequence]>,
    ) -> CoreResult<TrainingHistory> {
        if train.is_empty() {
            return Err(CoreError::InsufficientRows {
                rows: 0,
                window: model.window(),
            });
        }
        for sequence in train {
            if sequence.len() != model.window() {
                return Err(CoreError::shape("training sequence rows", model.window(), sequence.len()));
            }
            if sequence.width() != model.input_dim() {
                return Err(CoreError::shape("training sequence features", model.input_dim(), sequence.width()));
            }
        }
        let y = targets(train)?;
        let validation_targets = validation.map(targets).transpose()?;

        // Freeze check before any work
        let mut optimizer = Adam::new(&self.config, model.weights_for_training()?);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut history = TrainingHistory::default();

        log::info!(
            "Training on {} windows ({} epochs, batch {}, lr {})",
            train.len(),
            self.config.epochs,
            self.config.batch_size,
            self.config.learning_rate
        );

        for epoch in 1..=self.config.epochs {
            order.shuffle(&mut rng);

            let mut loss_sum = 0.0;
            let mut probabilities = vec![0.0; train.len()];

            for batch in order.chunks(self.config.batch_size) {
                let scale = 1.0 / batch.len() as f64;
                let mut grads = NetworkWeights::zeros_like(model.weights());

                for &i in batch {
                    let x = train[i].data();
                    let pass = model.forward_pass(x, Some(&mut rng));
                    probabilities[i] = pass.probability();
                    loss_sum += model.backward_pass(x, &pass, y[i], scale, &mut grads);
                }

                optimizer.update(model.weights_for_training()?, &grads);
            }

            let train_report = EvaluationReport::compute(&probabilities, &y, model.threshold());
            let validation_report = match (validation, &validation_targets) {
                (Some(val), Some(val_y)) => Some(evaluate_unchecked(model, val, val_y)),
                _ => None,
            };

            let metrics = EpochMetrics {
                epoch,
                loss: loss_sum / train.len() as f64,
                accuracy: train_report.accuracy,
                auc: roc_auc(&probabilities, &y),
                validation: validation_report,
            };

            log::info!(
                "Epoch {}/{}: loss={:.4} acc={:.4} auc={:.4}{}",
                epoch,
                self.config.epochs,
                metrics.loss,
                metrics.accuracy,
                metrics.auc,
                validation_report
                    .map(|v| format!(" val_loss={:.4} val_auc={:.4}", v.loss, v.auc))
                    .unwrap_or_default()
            );

            if !metrics.loss.is_finite() {
                log::error!("Training diverged at epoch {}", epoch);
                return Err(CoreError::InvalidConfig(format!("training diverged at epoch {}", epoch)));
            }

            history.epochs.push(metrics);
        }

        model.mark_trained();
        Ok(history)
    }
}

fn evaluate_unchecked(model: &AttentionPooledClassifier, sequences: &[Sequence], y: &[f64]) -> EvaluationReport {
    let probabilities: Vec<f64> = sequences
        .iter()
        .map(|s| model.probability_unchecked(s.data()))
        .collect();
    EvaluationReport::compute(&probabilities, y, model.threshold())
}

/// Evaluate a trained model on labelled windows
pub fn evaluate(model: &AttentionPooledClassifier, sequences: &[Sequence]) -> CoreResult<EvaluationReport> {
    let y = targets(sequences)?;
    let mut probabilities = Vec::with_capacity(sequences.len());
    for sequence in sequences {
        probabilities.push(model.predict(sequence)?.probability);
    }
    Ok(EvaluationReport::compute(&probabilities, &y, model.threshold()))
}
