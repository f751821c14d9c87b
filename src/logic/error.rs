//! Error taxonomy
//!
//! `CoreError` covers failures that abort an operation. Conditions that are
//! recovered locally (missing columns, degenerate ranges, non-finite inputs)
//! are never errors: they travel as `RecoveredIssue` values inside the
//! report of the stage that recovered them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Fewer rows than needed to form one window
    #[error("insufficient rows: {rows} rows cannot form a window of {window} (need more than {window})")]
    InsufficientRows { rows: usize, window: usize },

    /// Frozen artifact missing or unreadable
    #[error("schema contract missing: {artifact}: {reason}")]
    SchemaContractMissing { artifact: String, reason: String },

    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("layout mismatch: expected v{expected_version} ({expected_hash:08x}), got v{actual_version} ({actual_hash:08x})")]
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model has not been trained")]
    ModelNotTrained,

    #[error("model is frozen for serving and cannot be trained")]
    ModelFrozen,

    #[error("unsupported classifier input: {0}")]
    UnsupportedInput(String),

    #[error("{0} already installed")]
    AlreadyInstalled(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub fn contract_missing(artifact: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::SchemaContractMissing {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    pub fn shape(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        CoreError::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}

// ============================================================================
// STAGE CONTEXT
// ============================================================================

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    FeatureComputation,
    SchemaAlignment,
    Scaling,
    TrustScoring,
    Windowing,
    Classification,
    Training,
    ArtifactLoading,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FeatureComputation => "feature_computation",
            Stage::SchemaAlignment => "schema_alignment",
            Stage::Scaling => "scaling",
            Stage::TrustScoring => "trust_scoring",
            Stage::Windowing => "windowing",
            Stage::Classification => "classification",
            Stage::Training => "training",
            Stage::ArtifactLoading => "artifact_loading",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `CoreError` annotated with the stage and input shape it failed on
#[derive(Debug, Error)]
#[error("{stage} failed on {rows}x{cols} input: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub rows: usize,
    pub cols: usize,
    #[source]
    pub source: CoreError,
}

impl PipelineError {
    pub fn new(stage: Stage, shape: (usize, usize), source: CoreError) -> Self {
        Self {
            stage,
            rows: shape.0,
            cols: shape.1,
            source,
        }
    }

    pub fn is_insufficient_rows(&self) -> bool {
        matches!(self.source, CoreError::InsufficientRows { .. })
    }
}

/// Attach stage context to a `CoreResult`
pub trait StageContext<T> {
    fn at_stage(self, stage: Stage, shape: (usize, usize)) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for CoreResult<T> {
    fn at_stage(self, stage: Stage, shape: (usize, usize)) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(stage, shape, e))
    }
}

// ============================================================================
// RECOVERED CONDITIONS
// ============================================================================

/// A condition recovered locally that changed the numeric result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecoveredIssue {
    /// Required column absent, defaulted to 0.0
    MissingColumn { stage: Stage, column: String },
    /// Normalization range was zero, neutral 0.5 used
    DegenerateRange { term: String },
    /// Non-finite values replaced by 0.0
    NonFinite { column: String, count: usize },
}

impl std::fmt::Display for RecoveredIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveredIssue::MissingColumn { stage, column } => {
                write!(f, "[{}] column '{}' missing, filled with 0.0", stage, column)
            }
            RecoveredIssue::DegenerateRange { term } => {
                write!(f, "degenerate range for '{}', using 0.5", term)
            }
            RecoveredIssue::NonFinite { column, count } => {
                write!(f, "{} non-finite values in '{}' replaced with 0.0", count, column)
            }
        }
    }
}
