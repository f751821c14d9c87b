//! Serving pipeline
//!
//! Built once from an `ArtifactSet`; every method takes `&self`, so a
//! single `Pipeline` can serve concurrent callers.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::logic::config::PipelineConfig;
use crate::logic::error::{CoreResult, PipelineError, RecoveredIssue, Stage, StageContext};
use crate::logic::features::{FeatureComputer, FlowRecord};
use crate::logic::model::{BatchSummary, Prediction, SequenceWindower};
use crate::logic::schema::AlignmentReport;
use crate::logic::trust::{TrustReport, TrustScorer, TrustWeights};

use super::artifacts::{self, ArtifactSet};
use super::preprocess::Preprocessor;

/// Score path output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub trust: TrustReport,
    pub alignment: AlignmentReport,
}

/// Classification path output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyOutput {
    pub predictions: Vec<Prediction>,
    pub summary: BatchSummary,
    pub issues: Vec<RecoveredIssue>,
}

/// End-to-end score / classify over frozen artifacts
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    artifacts: ArtifactSet,
    preprocessor: Preprocessor,
    windower: SequenceWindower,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, artifacts: ArtifactSet, weights: TrustWeights) -> CoreResult<Self> {
        config.validate()?;
        artifacts.validate()?;

        let window = artifacts.model.window();
        if window != config.window {
            log::warn!(
                "Configured window {} differs from trained window {}, using {}",
                config.window,
                window,
                window
            );
        }

        let computer = FeatureComputer::with_aggregates(artifacts.aggregates.clone());
        let preprocessor = Preprocessor::new(computer, artifacts.schema.clone(), TrustScorer::new(weights)?);

        log::info!(
            "Pipeline ready: {} columns, window {}, trust augmentation {}",
            artifacts.schema.len(),
            window,
            if preprocessor.augments() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            windower: SequenceWindower::new(window)?,
            artifacts,
            preprocessor,
        })
    }

    /// Pipeline over the process-wide installed artifacts
    pub fn from_installed(config: PipelineConfig) -> CoreResult<Self> {
        let set = artifacts::current()?.clone();
        Self::new(config, set, TrustWeights::default())
    }

    /// Pipeline over the artifacts saved in `config.artifact_dir`
    pub fn open(config: PipelineConfig) -> Result<Self, PipelineError> {
        let set = ArtifactSet::load(&config.artifact_dir).at_stage(Stage::ArtifactLoading, (0, 0))?;
        let cols = set.schema.len();
        Self::new(config, set, TrustWeights::default()).at_stage(Stage::ArtifactLoading, (0, cols))
    }

    /// Startup path: environment config, then load and install the artifacts
    /// from its artifact directory
    pub fn from_env() -> Result<Self, PipelineError> {
        let config = PipelineConfig::from_env();
        let set = artifacts::load_and_install(&config.artifact_dir).at_stage(Stage::ArtifactLoading, (0, 0))?;
        let cols = set.schema.len();
        Self::new(config, set.clone(), TrustWeights::default()).at_stage(Stage::ArtifactLoading, (0, cols))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    pub fn trust_scorer(&self) -> &TrustScorer {
        self.preprocessor.scorer()
    }

    /// Per-row Trust_Score and components
    pub fn score(&self, records: &[FlowRecord]) -> Result<ScoreOutput, PipelineError> {
        let (_, trust, alignment) = self.preprocessor.score(records)?;
        log::info!("Scored {} flows, mean trust {:.4}", trust.len(), trust.mean_score());
        Ok(ScoreOutput { trust, alignment })
    }

    fn scaled(&self, records: &[FlowRecord]) -> Result<(Array2<f64>, Vec<RecoveredIssue>), PipelineError> {
        let prepared = self.preprocessor.prepare(records)?;
        let scaled = self
            .artifacts
            .scaler
            .transform(prepared.frame.view())
            .at_stage(Stage::Scaling, prepared.frame.shape())?;
        Ok((scaled, prepared.issues()))
    }

    /// Windows over the whole batch at once
    pub fn classify(&self, records: &[FlowRecord]) -> Result<ClassifyOutput, PipelineError> {
        let (matrix, issues) = self.scaled(records)?;
        let shape = matrix.dim();

        let sequences = self
            .windower
            .sequences(matrix.view(), None)
            .at_stage(Stage::Windowing, shape)?;

        let (predictions, summary) = self
            .artifacts
            .model
            .predict_batch(&sequences, self.config.inference_batch)
            .at_stage(Stage::Classification, shape)?;

        log_summary(&summary);
        Ok(ClassifyOutput {
            predictions,
            summary,
            issues,
        })
    }

    /// Same window positions as `classify`, holding at most `chunk_rows + W` rows.
    ///
    /// Trust terms are min-max normalized per chunk, so with trust
    /// augmentation the probabilities can differ slightly from `classify`.
    /// Without it the two paths agree exactly.
    pub fn classify_chunked(&self, records: &[FlowRecord]) -> Result<ClassifyOutput, PipelineError> {
        let mut windower = self.windower.chunked();
        let mut output = ClassifyOutput::default();
        let width = self.artifacts.schema.len();

        for chunk in records.chunks(self.config.chunk_rows) {
            let (matrix, issues) = self.scaled(chunk)?;
            let shape = matrix.dim();
            output.issues.extend(issues);

            let sequences = windower
                .push(matrix.view(), None)
                .at_stage(Stage::Windowing, shape)?;
            if sequences.is_empty() {
                continue;
            }

            let (predictions, summary) = self
                .artifacts
                .model
                .predict_batch(&sequences, self.config.inference_batch)
                .at_stage(Stage::Classification, shape)?;

            output.predictions.extend(predictions);
            output.summary = output.summary.merge(&summary);
        }

        windower
            .finish()
            .at_stage(Stage::Windowing, (records.len(), width))?;

        log_summary(&output.summary);
        Ok(output)
    }
}

fn log_summary(summary: &BatchSummary) {
    log::info!(
        "Classified {} windows: {} positive, mean p={:.4}",
        summary.sequence_count,
        summary.positive_count,
        summary.mean_probability
    );
}
