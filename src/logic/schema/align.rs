//! Schema alignment
//!
//! Inserts missing schema columns as 0.0, drops extras and reorders to the
//! schema order. Aligning an already aligned input is a no-op.

use std::sync::Arc;

use ndarray::Array2;

use crate::logic::error::{CoreError, CoreResult, RecoveredIssue};
use crate::logic::features::{FeatureFrame, FeatureVector};
use super::types::{AlignmentReport, FeatureSchema};

/// Enforces the frozen column contract
#[derive(Debug, Clone, Default)]
pub struct SchemaAligner {
    schema: Option<Arc<FeatureSchema>>,
}

/// Source column for every schema column
struct AlignmentPlan {
    sources: Vec<Option<usize>>,
    report: AlignmentReport,
}

impl SchemaAligner {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema: Some(schema) }
    }

    pub fn schema(&self) -> CoreResult<&FeatureSchema> {
        self.schema
            .as_deref()
            .ok_or_else(|| CoreError::contract_missing("feature schema", "no schema loaded"))
    }

    fn plan(&self, input: &[String]) -> CoreResult<AlignmentPlan> {
        let schema = self.schema()?;
        let mut report = AlignmentReport::default();

        let sources: Vec<Option<usize>> = schema
            .columns
            .iter()
            .map(|col| input.iter().position(|c| c == col))
            .collect();

        for (col, source) in schema.columns.iter().zip(&sources) {
            if source.is_none() {
                log::warn!("Schema column '{}' missing from input, filling with 0.0", col);
                report.record_added(col);
            }
        }

        report.dropped = input
            .iter()
            .filter(|c| schema.index_of(c).is_none())
            .cloned()
            .collect();
        if !report.dropped.is_empty() {
            log::debug!("Dropping {} columns outside the schema: {:?}", report.dropped.len(), report.dropped);
        }

        let kept: Vec<usize> = sources.iter().flatten().copied().collect();
        report.reordered = kept.windows(2).any(|w| w[0] > w[1]);

        Ok(AlignmentPlan { sources, report })
    }

    /// Align a single vector. Non-finite values become 0.0.
    pub fn align(&self, vector: &FeatureVector) -> CoreResult<(FeatureVector, AlignmentReport)> {
        let mut plan = self.plan(vector.columns())?;
        let schema = self.schema()?;

        let mut aligned = FeatureVector::with_capacity(schema.len());
        for (col, source) in schema.columns.iter().zip(&plan.sources) {
            let value = match source.map(|j| vector.values()[j]) {
                Some(v) if !v.is_finite() => {
                    log::warn!("Non-finite value in '{}' replaced with 0.0", col);
                    plan.report.issues.push(RecoveredIssue::NonFinite {
                        column: col.clone(),
                        count: 1,
                    });
                    0.0
                }
                Some(v) => v,
                None => 0.0,
            };
            aligned.set(col.clone(), value);
        }

        Ok((aligned, plan.report))
    }

    /// Align a whole frame with one plan. Non-finite cells become 0.0.
    pub fn align_frame(&self, frame: &FeatureFrame) -> CoreResult<(FeatureFrame, AlignmentReport)> {
        let mut plan = self.plan(frame.columns())?;
        let schema = self.schema()?;

        let mut data = Array2::zeros((frame.nrows(), schema.len()));
        for (j, source) in plan.sources.iter().enumerate() {
            let Some(src) = source else { continue };

            let mut non_finite = 0usize;
            for (dst, value) in data.column_mut(j).iter_mut().zip(frame.data().column(*src)) {
                if value.is_finite() {
                    *dst = *value;
                } else {
                    non_finite += 1;
                }
            }

            if non_finite > 0 {
                log::warn!("{} non-finite values in '{}' replaced with 0.0", non_finite, schema.columns[j]);
                plan.report.issues.push(RecoveredIssue::NonFinite {
                    column: schema.columns[j].clone(),
                    count: non_finite,
                });
            }
        }

        let aligned = FeatureFrame::new(schema.columns.clone(), data)?;
        Ok((aligned, plan.report))
    }
}
