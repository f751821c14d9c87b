//! Configuration
//!
//! Immutable configuration values injected at construction. Defaults come
//! from `constants.rs`; `PipelineConfig::from_env` applies environment
//! overrides once at startup.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::constants;
use super::error::{CoreError, CoreResult};

// ============================================================================
// PIPELINE
// ============================================================================

/// Serving / orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rows per sequence (W)
    pub window: usize,

    /// Rows per chunk on the classification path
    pub chunk_rows: usize,

    /// Sequences per forward-pass minibatch
    pub inference_batch: usize,

    /// Probability above which a window is labelled 1
    pub decision_threshold: f64,

    /// Append trust components as model features
    pub augment_with_trust: bool,

    /// Directory holding the frozen artifacts
    pub artifact_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: constants::DEFAULT_WINDOW,
            chunk_rows: constants::DEFAULT_CHUNK_ROWS,
            inference_batch: constants::DEFAULT_INFERENCE_BATCH,
            decision_threshold: constants::DEFAULT_DECISION_THRESHOLD,
            augment_with_trust: true,
            artifact_dir: constants::default_artifact_dir(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            window: constants::get_window(),
            chunk_rows: constants::get_chunk_rows(),
            inference_batch: constants::get_inference_batch(),
            decision_threshold: constants::get_decision_threshold(),
            augment_with_trust: constants::is_trust_augmentation_enabled(),
            artifact_dir: constants::get_artifact_dir(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.window == 0 {
            return Err(CoreError::InvalidConfig("window must be > 0".into()));
        }
        // A chunk must at least hold one look-ahead window
        if self.chunk_rows <= self.window {
            return Err(CoreError::InvalidConfig(format!(
                "chunk_rows ({}) must exceed window ({})",
                self.chunk_rows, self.window
            )));
        }
        if self.inference_batch == 0 {
            return Err(CoreError::InvalidConfig("inference_batch must be > 0".into()));
        }
        if !(self.decision_threshold > 0.0 && self.decision_threshold < 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "decision_threshold {} not in (0, 1)",
                self.decision_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Attention-pooled BiGRU architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// GRU units per direction (D = 2 * hidden_units)
    pub hidden_units: usize,

    /// Width of the ReLU dense layer
    pub dense_units: usize,

    /// Dropout rate after the dense layer (training only)
    pub dropout: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_units: 128,
            dense_units: 64,
            dropout: 0.3,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.hidden_units == 0 || self.dense_units == 0 {
            return Err(CoreError::InvalidConfig("layer widths must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(CoreError::InvalidConfig(format!(
                "dropout {} not in [0, 1)",
                self.dropout
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TRAINING
// ============================================================================

/// Minibatch Adam training budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// Seed for weight init, dropout masks and batch shuffling
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            batch_size: 64,
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            seed: 42,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(CoreError::InvalidConfig("epochs and batch_size must be > 0".into()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(CoreError::InvalidConfig("learning_rate must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(ModelConfig::default().validate().is_ok());
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_artifact_dir_is_local_data_dir() {
        let dir = PipelineConfig::default().artifact_dir;
        assert_eq!(dir, constants::default_artifact_dir());
        assert!(dir.ends_with("trustcast/artifacts"));
    }

    #[test]
    fn test_pipeline_config_rejects_small_chunks() {
        let config = PipelineConfig {
            chunk_rows: 20,
            window: 20,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_model_config_rejects_bad_dropout() {
        let config = ModelConfig {
            dropout: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
