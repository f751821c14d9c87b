//! Logic Module - Feature Contract, Trust & Sequence Engines
//!
//! ## Architecture
//! - `features/` - Feature extraction (structural, temporal, density, security, aggregates)
//! - `schema/` - Frozen feature schema + alignment
//! - `scaler` - Frozen standardization statistics
//! - `trust/` - Multi-dimensional Trust Score
//! - `model/` - Windowing, attention-pooled BiGRU, training, evaluation
//! - `dataset/` - Reference partition selection
//! - `pipeline` - Orchestration + process-wide artifacts

pub mod config;
pub mod error;
pub mod storage;

pub mod features;
pub mod schema;
pub mod scaler;
pub mod trust;
pub mod model;
pub mod dataset;
pub mod pipeline;
