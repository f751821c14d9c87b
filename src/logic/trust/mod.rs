//! Trust Module - Interpretable Per-Flow Trust Score
//!
//! Seven sub-trust dimensions from batch-normalized features, combined
//! into one bounded Trust_Score with immutable weights.
//!
//! # Architecture
//! - `normalize.rs`: min-max normalization with degenerate fallback
//! - `weights.rs`: `TrustWeights` (validated, immutable)
//! - `types.rs`: `TrustComponents`, `TrustAssessment`, `TrustReport`
//! - `engine.rs`: `TrustScorer`

pub mod normalize;
pub mod weights;
pub mod types;
pub mod engine;

pub use engine::{TrustScorer, COMPONENT_COLUMNS, REQUIRED_COLUMNS, TRUST_COLUMNS};
pub use normalize::normalize;
pub use types::{TrustAssessment, TrustComponents, TrustReport};
pub use weights::TrustWeights;
