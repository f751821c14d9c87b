//! Features Module - Flow Feature Computation
//!
//! Turns raw flow records into the ordered feature vector.
//! Each extractor owns one feature group; `FeatureComputer` runs them in
//! `FEATURE_LAYOUT` order.

pub mod layout;
pub mod record;
pub mod vector;
pub mod raw;
pub mod structural;
pub mod temporal;
pub mod density;
pub mod security;
pub mod aggregates;
pub mod computer;

#[cfg(test)]
mod tests;

// Re-export common types
pub use aggregates::{AggregateMap, ReferenceAggregates};
pub use computer::FeatureComputer;
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use record::FlowRecord;
pub use vector::{FeatureExtractor, FeatureFrame, FeatureVector};
