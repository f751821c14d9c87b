//! Schema Module - Frozen Feature Contract
//!
//! Guarantees training and serving see the same columns in the same order.
//!
//! # Architecture
//! - `types.rs`: `FeatureSchema`, `AlignmentReport`
//! - `align.rs`: `SchemaAligner` (fill / drop / reorder)
//! - `validate.rs`: Version/hash validation of persisted schemas
//!
//! # Failure Strategy
//! Missing columns are recovered (0.0) and reported. A missing or
//! incompatible schema is fatal.

pub mod types;
pub mod align;
pub mod validate;
#[cfg(test)]
mod tests;

pub use align::SchemaAligner;
pub use types::{AlignmentReport, FeatureSchema};
pub use validate::{validate_binding, validate_schema};
