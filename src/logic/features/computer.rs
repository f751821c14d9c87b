//! Feature Computer - runs every extractor in layout order
//!
//! Pure transform from `FlowRecord` to `FeatureVector`. Aggregate columns
//! are only emitted when reference aggregates are attached.

use std::sync::Arc;

use ndarray::Array2;

use super::aggregates::ReferenceAggregates;
use super::density::DensityFeatures;
use super::layout::{AGGREGATE_COLUMNS, FEATURE_COUNT, FEATURE_LAYOUT};
use super::raw::RawFeatures;
use super::record::FlowRecord;
use super::security::SecurityFeatures;
use super::structural::StructuralFeatures;
use super::temporal::TemporalFeatures;
use super::vector::{FeatureExtractor, FeatureFrame, FeatureVector};
use crate::logic::error::CoreResult;

/// Computes the feature vector for flow records
#[derive(Debug, Clone, Default)]
pub struct FeatureComputer {
    raw: RawFeatures,
    structural: StructuralFeatures,
    temporal: TemporalFeatures,
    density: DensityFeatures,
    security: SecurityFeatures,
    aggregates: Option<Arc<ReferenceAggregates>>,
}

impl FeatureComputer {
    /// Computer without reference aggregates
    pub fn new() -> Self {
        Self::default()
    }

    /// Computer that also emits the reference aggregate columns
    pub fn with_aggregates(aggregates: Arc<ReferenceAggregates>) -> Self {
        Self {
            aggregates: Some(aggregates),
            ..Self::default()
        }
    }

    pub fn has_aggregates(&self) -> bool {
        self.aggregates.is_some()
    }

    /// Column order this computer emits
    pub fn columns(&self) -> Vec<String> {
        FEATURE_LAYOUT
            .iter()
            .filter(|name| self.has_aggregates() || !AGGREGATE_COLUMNS.contains(name))
            .map(|s| s.to_string())
            .collect()
    }

    /// Compute features for a single record
    pub fn compute(&self, record: &FlowRecord) -> FeatureVector {
        let mut vector = FeatureVector::with_capacity(FEATURE_COUNT);

        self.raw.extract(record, &mut vector);
        self.structural.extract(record, &mut vector);
        self.temporal.extract(record, &mut vector);
        self.density.extract(record, &mut vector);
        self.security.extract(record, &mut vector);

        if let Some(aggregates) = &self.aggregates {
            aggregates.extract(record, &mut vector);
        }

        vector
    }

    /// Compute a frame for a batch of records
    pub fn compute_batch(&self, records: &[FlowRecord]) -> CoreResult<FeatureFrame> {
        let columns = self.columns();

        if !self.has_aggregates() {
            log::warn!(
                "No reference aggregates attached, omitting {:?}",
                AGGREGATE_COLUMNS
            );
        }

        let mut data = Array2::zeros((records.len(), columns.len()));
        for (i, record) in records.iter().enumerate() {
            let vector = self.compute(record);
            for (j, value) in vector.values().iter().enumerate() {
                data[[i, j]] = *value;
            }
        }

        log::debug!("Computed {}x{} feature frame", records.len(), columns.len());
        FeatureFrame::new(columns, data)
    }
}
