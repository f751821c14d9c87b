//! Model Module - Sequence Classification Engine
//!
//! Windows → BiGRU encoder → attention pooling → dense head.
//!
//! # Architecture
//! - `window.rs`: `SequenceWindower`, `ChunkedWindower`, `Sequence`
//! - `gru.rs` / `attention.rs`: layers with hand-derived gradients
//! - `network.rs`: `AttentionPooledClassifier` and its state machine
//! - `optimizer.rs` / `train.rs`: Adam + minibatch training loop
//! - `metrics.rs`: accuracy, precision, recall, F1, AUC
//! - `classifier.rs`: `Classifier` capability shared with `onnx.rs`

pub mod math;
pub mod window;
pub mod gru;
pub mod attention;
pub mod network;
pub mod optimizer;
pub mod metrics;
pub mod train;
pub mod classifier;
#[cfg(feature = "onnx")]
pub mod onnx;
#[cfg(test)]
mod tests;

// Re-export common types
pub use classifier::{Classifier, ClassifierInput, ClassifierOutput};
pub use metrics::{ConfusionMatrix, EvaluationReport};
pub use network::{
    AttentionPooledClassifier, BatchSummary, ModelArtifact, ModelState, ModelStatus, NetworkWeights,
};
pub use train::{evaluate, EpochMetrics, Trainer, TrainingHistory};
pub use window::{ChunkedWindower, Prediction, Sequence, SequenceWindower};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
