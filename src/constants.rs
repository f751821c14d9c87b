//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every `get_*` helper reads a `TRUSTCAST_*` environment variable and
//! falls back to the compiled-in default.

use std::path::PathBuf;

/// Default sliding window length (rows per sequence)
pub const DEFAULT_WINDOW: usize = 20;

/// Rows processed per chunk on the classification path
pub const DEFAULT_CHUNK_ROWS: usize = 4096;

/// Sequences per forward-pass minibatch at serving time
pub const DEFAULT_INFERENCE_BATCH: usize = 64;

/// Probability above which a window is labelled malicious
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Divisor for `connection_rate`
pub const TIME_WINDOW: f64 = 100.0;

/// Smoothing constant for ratio features and normalization
pub const EPS: f64 = 1e-6;

/// Floor applied to per-column standard deviation by the scaler
pub const SCALER_EPS: f64 = 1e-6;

/// Probability clamp so predictions stay strictly inside (0, 1)
pub const PROBABILITY_EPS: f64 = 1e-7;

/// Artifact file names
pub const SCHEMA_FILE: &str = "feature_schema.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const AGGREGATES_FILE: &str = "aggregates.json";
pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "TrustCast";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Artifact directory under the local data dir
pub fn default_artifact_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trustcast")
        .join("artifacts")
}

/// Get artifact directory from environment or use the local data dir
pub fn get_artifact_dir() -> PathBuf {
    std::env::var("TRUSTCAST_ARTIFACT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_artifact_dir())
}

/// Get window length from environment or use default
pub fn get_window() -> usize {
    std::env::var("TRUSTCAST_WINDOW")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|w: &usize| *w > 0)
        .unwrap_or(DEFAULT_WINDOW)
}

/// Get chunk size from environment or use default
pub fn get_chunk_rows() -> usize {
    std::env::var("TRUSTCAST_CHUNK_ROWS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_CHUNK_ROWS)
}

/// Get inference batch size from environment or use default
pub fn get_inference_batch() -> usize {
    std::env::var("TRUSTCAST_INFERENCE_BATCH")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_INFERENCE_BATCH)
}

/// Get decision threshold from environment or use default
pub fn get_decision_threshold() -> f64 {
    std::env::var("TRUSTCAST_DECISION_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|t: &f64| *t > 0.0 && *t < 1.0)
        .unwrap_or(DEFAULT_DECISION_THRESHOLD)
}

/// Check if trust components are appended to the model features
pub fn is_trust_augmentation_enabled() -> bool {
    std::env::var("TRUSTCAST_AUGMENT_WITH_TRUST")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}
