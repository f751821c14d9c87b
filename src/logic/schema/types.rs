use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::logic::error::{RecoveredIssue, Stage};
use crate::logic::features::layout::{hash_columns, FEATURE_VERSION};
use crate::logic::features::FeatureFrame;

/// Columns never part of the numeric contract
pub const NON_FEATURE_COLUMNS: &[&str] = &["label", "Label"];

// ============================================================================
// FEATURE SCHEMA
// ============================================================================

/// Frozen, ordered column contract captured at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u8,
    /// CRC32 of version + ordered columns
    pub layout_hash: u32,
    pub columns: Vec<String>,
    pub created_at: i64, // Unix timestamp
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: hash_columns(FEATURE_VERSION, &columns),
            columns,
            created_at: Utc::now().timestamp(),
        }
    }

    /// Capture the numeric columns of a training frame, label excluded
    pub fn capture(frame: &FeatureFrame) -> Self {
        let columns = frame
            .columns()
            .iter()
            .filter(|c| !NON_FEATURE_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        Self::new(columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

// ============================================================================
// ALIGNMENT REPORT
// ============================================================================

/// What alignment changed to make an input match the schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Schema columns absent from the input, filled with 0.0
    pub added: Vec<String>,
    /// Input columns not in the schema
    pub dropped: Vec<String>,
    /// Kept columns arrived in a different order
    pub reordered: bool,
    pub issues: Vec<RecoveredIssue>,
}

impl AlignmentReport {
    /// Input already matched the schema exactly
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty() && !self.reordered && self.issues.is_empty()
    }

    pub(crate) fn record_added(&mut self, column: &str) {
        self.added.push(column.to_string());
        self.issues.push(RecoveredIssue::MissingColumn {
            stage: Stage::SchemaAlignment,
            column: column.to_string(),
        });
    }
}
