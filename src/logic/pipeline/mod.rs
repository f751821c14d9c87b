//! Pipeline Module - Orchestration + process-wide artifacts
//!
//! # Architecture
//! - `artifacts.rs`: `ArtifactSet`, manifest, write-once global store
//! - `preprocess.rs`: records → aligned, trust-scored feature frame
//! - `engine.rs`: `Pipeline` score / classify / classify_chunked
//! - `fit.rs`: training orchestration producing an `ArtifactSet`

pub mod artifacts;
mod preprocess;
pub mod engine;
pub mod fit;


pub use artifacts::{current, install, load_and_install, ArtifactManifest, ArtifactSet};
pub use engine::{ClassifyOutput, Pipeline, ScoreOutput};
pub use fit::{fit, FitConfig, FitOutput};
pub use preprocess::PreparedBatch;
