//! Training orchestration
//!
//! split → reference aggregates → features + trust → schema capture →
//! scaler fit → windowing → training → frozen `ArtifactSet`.
//! Every fitted artifact sees the reference (train) partition only.

use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::logic::config::{ModelConfig, PipelineConfig, TrainConfig};
use crate::logic::dataset::{ChronologicalSplit, SplitRatios};
use crate::logic::error::{PipelineError, Stage, StageContext};
use crate::logic::features::{FeatureComputer, FlowRecord, ReferenceAggregates};
use crate::logic::model::{
    evaluate, AttentionPooledClassifier, EvaluationReport, Sequence, SequenceWindower, Trainer,
    TrainingHistory,
};
use crate::logic::scaler::ScalerState;
use crate::logic::schema::FeatureSchema;
use crate::logic::trust::{TrustScorer, TrustWeights};

use super::artifacts::ArtifactSet;
use super::preprocess::Preprocessor;

/// Everything a training run needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FitConfig {
    pub pipeline: PipelineConfig,
    pub model: ModelConfig,
    pub train: TrainConfig,
    pub split: SplitRatios,
    pub weights: TrustWeights,
}

/// Result of a training run
#[derive(Debug)]
pub struct FitOutput {
    pub artifacts: ArtifactSet,
    pub history: TrainingHistory,
    /// Held-out chronological test partition, when it holds a window
    pub test: Option<EvaluationReport>,
}

/// Fit every artifact from a labelled corpus
pub fn fit(records: Vec<FlowRecord>, config: &FitConfig) -> Result<FitOutput, PipelineError> {
    let total = records.len();
    config.pipeline.validate().at_stage(Stage::Training, (total, 0))?;

    let split = ChronologicalSplit::split(records, config.split).at_stage(Stage::Training, (total, 0))?;

    let aggregates = Arc::new(
        ReferenceAggregates::fit(&split.train).at_stage(Stage::FeatureComputation, (split.train.len(), 0))?,
    );
    let computer = FeatureComputer::with_aggregates(aggregates.clone());

    let scorer = TrustScorer::new(config.weights).at_stage(Stage::TrustScoring, (total, 0))?;

    let mut reference = computer
        .compute_batch(&split.train)
        .at_stage(Stage::FeatureComputation, (split.train.len(), 0))?;
    if config.pipeline.augment_with_trust {
        let trust = scorer.score(&reference);
        scorer
            .augment(&mut reference, &trust)
            .at_stage(Stage::TrustScoring, reference.shape())?;
    }
    let schema = Arc::new(FeatureSchema::capture(&reference));
    log::info!(
        "Captured schema: {} columns, layout {:08x}",
        schema.len(),
        schema.layout_hash
    );
    let preprocessor = Preprocessor::new(computer, schema.clone(), scorer);

    let prepared = preprocessor.prepare(&split.train)?;
    let scaler = Arc::new(
        ScalerState::fit(&schema, prepared.frame.view()).at_stage(Stage::Scaling, prepared.frame.shape())?,
    );

    let window = config.pipeline.window;
    let windower = SequenceWindower::new(window).at_stage(Stage::Windowing, (total, 0))?;
    let partition = |records: &[FlowRecord]| -> Result<Vec<Sequence>, PipelineError> {
        let prepared = preprocessor.prepare(records)?;
        let shape = prepared.frame.shape();
        let scaled = scaler.transform(prepared.frame.view()).at_stage(Stage::Scaling, shape)?;
        windower
            .sequences(scaled.view(), Some(labels(records).view()))
            .at_stage(Stage::Windowing, shape)
    };

    let train = partition(&split.train)?;
    let validation = optional_partition(&split.validation, window, "validation", &partition)?;
    let test = optional_partition(&split.test, window, "test", &partition)?;

    let mut model = AttentionPooledClassifier::new(schema.len(), window, config.model.clone(), config.train.seed)
        .at_stage(Stage::Training, (train.len(), schema.len()))?
        .with_threshold(config.pipeline.decision_threshold);

    let trainer = Trainer::new(config.train.clone()).at_stage(Stage::Training, (train.len(), schema.len()))?;
    let history = trainer
        .fit(&mut model, &train, validation.as_deref())
        .at_stage(Stage::Training, (train.len(), schema.len()))?;

    let test_report = match &test {
        Some(sequences) => {
            let report = evaluate(&model, sequences).at_stage(Stage::Classification, (sequences.len(), schema.len()))?;
            log::info!(
                "Test: acc={:.4} precision={:.4} recall={:.4} f1={:.4} auc={:.4}",
                report.accuracy,
                report.precision,
                report.recall,
                report.f1,
                report.auc
            );
            Some(report)
        }
        None => None,
    };

    model.freeze().at_stage(Stage::Training, (train.len(), schema.len()))?;

    let artifacts = ArtifactSet::new(schema, scaler, aggregates, Arc::new(model))
        .at_stage(Stage::Training, (total, 0))?;

    Ok(FitOutput {
        artifacts,
        history,
        test: test_report,
    })
}

/// Labels as f64; unlabelled rows count as benign
fn labels(records: &[FlowRecord]) -> Array1<f64> {
    let missing = records.iter().filter(|r| r.label.is_none()).count();
    if missing > 0 {
        log::warn!("{} records without a label, treating as 0", missing);
    }
    records
        .iter()
        .map(|r| f64::from(r.label.unwrap_or(0).min(1)))
        .collect()
}

/// Partitions too small for one window are skipped rather than fatal
fn optional_partition<F>(
    records: &[FlowRecord],
    window: usize,
    name: &str,
    partition: &F,
) -> Result<Option<Vec<Sequence>>, PipelineError>
where
    F: Fn(&[FlowRecord]) -> Result<Vec<Sequence>, PipelineError>,
{
    if records.len() <= window {
        log::warn!(
            "{} partition has {} rows, need more than {}; skipping",
            name,
            records.len(),
            window
        );
        return Ok(None);
    }
    partition(records).map(Some)
}
