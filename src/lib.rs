//! TrustCast Core - Flow Trust Scoring & Sequence Classification
//!
//! Turns raw network-flow records into a frozen numeric feature contract,
//! scores every flow with a closed-form multi-dimensional Trust Score and
//! classifies sliding windows of flows with an attention-pooled BiGRU.
//!
//! ## Layout
//! - `logic::features` - FlowRecord -> FeatureVector (FeatureComputer)
//! - `logic::schema` - frozen column contract (SchemaAligner)
//! - `logic::scaler` - frozen standardization (Scaler)
//! - `logic::trust` - closed-form Trust Score (TrustScorer)
//! - `logic::model` - windowing, BiGRU + attention classifier, training
//! - `logic::dataset` - JSONL flow corpora, chronological split
//! - `logic::pipeline` - end-to-end score / classify / fit

pub mod constants;
pub mod logic;

pub use logic::config::{ModelConfig, PipelineConfig, TrainConfig};
pub use logic::error::{CoreError, PipelineError, RecoveredIssue, Stage};
pub use logic::features::{FeatureComputer, FeatureFrame, FeatureVector, FlowRecord, ReferenceAggregates};
pub use logic::model::{
    AttentionPooledClassifier, BatchSummary, Classifier, ClassifierOutput, Prediction, Sequence,
    SequenceWindower, Trainer,
};
pub use logic::pipeline::{fit, ArtifactSet, FitConfig, Pipeline};
pub use logic::scaler::ScalerState;
pub use logic::schema::{AlignmentReport, FeatureSchema, SchemaAligner};
pub use logic::trust::{TrustComponents, TrustScorer, TrustWeights};

/// Initialize env_logger with `info` as the default filter.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
