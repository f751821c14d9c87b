//! Record → model matrix path shared by serving and fitting
//!
//! compute → align to base columns → trust score (unscaled) →
//! optional trust augmentation → align to the full schema.
//! Scaling is applied by the caller with the frozen scaler.

use std::sync::Arc;

use crate::logic::error::{PipelineError, RecoveredIssue, Stage, StageContext};
use crate::logic::features::{FeatureComputer, FeatureFrame, FlowRecord};
use crate::logic::schema::{AlignmentReport, FeatureSchema, SchemaAligner};
use crate::logic::trust::{TrustReport, TrustScorer, TRUST_COLUMNS};

/// Aligned, unscaled features of one batch
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub frame: FeatureFrame,
    pub trust: TrustReport,
    pub alignment: AlignmentReport,
}

impl PreparedBatch {
    /// Recovered conditions from alignment and trust scoring
    pub fn issues(&self) -> Vec<RecoveredIssue> {
        self.alignment
            .issues
            .iter()
            .chain(self.trust.issues.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Preprocessor {
    computer: FeatureComputer,
    base: SchemaAligner,
    full: SchemaAligner,
    scorer: TrustScorer,
    augment: bool,
}

impl Preprocessor {
    /// Trust columns in the schema switch augmentation on
    pub(crate) fn new(computer: FeatureComputer, schema: Arc<FeatureSchema>, scorer: TrustScorer) -> Self {
        let base_columns: Vec<String> = schema
            .columns
            .iter()
            .filter(|c| !TRUST_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        let augment = base_columns.len() != schema.len();

        Self {
            computer,
            base: SchemaAligner::new(Arc::new(FeatureSchema::new(base_columns))),
            full: SchemaAligner::new(schema),
            scorer,
            augment,
        }
    }

    pub(crate) fn augments(&self) -> bool {
        self.augment
    }

    pub(crate) fn scorer(&self) -> &TrustScorer {
        &self.scorer
    }

    /// Base-aligned features and their trust scores
    pub(crate) fn score(&self, records: &[FlowRecord]) -> Result<(FeatureFrame, TrustReport, AlignmentReport), PipelineError> {
        let computed = self
            .computer
            .compute_batch(records)
            .at_stage(Stage::FeatureComputation, (records.len(), 0))?;

        let (base, alignment) = self
            .base
            .align_frame(&computed)
            .at_stage(Stage::SchemaAlignment, computed.shape())?;

        let trust = self.scorer.score(&base);
        Ok((base, trust, alignment))
    }

    /// Features in full schema order, ready for scaling
    pub(crate) fn prepare(&self, records: &[FlowRecord]) -> Result<PreparedBatch, PipelineError> {
        let (mut frame, trust, mut alignment) = self.score(records)?;

        if self.augment {
            self.scorer
                .augment(&mut frame, &trust)
                .at_stage(Stage::TrustScoring, frame.shape())?;
        }

        let (aligned, report) = self
            .full
            .align_frame(&frame)
            .at_stage(Stage::SchemaAlignment, frame.shape())?;

        // Base alignment already reported what the input lacked
        alignment.reordered |= report.reordered;
        alignment.issues.extend(report.issues);

        Ok(PreparedBatch {
            frame: aligned,
            trust,
            alignment,
        })
    }
}
