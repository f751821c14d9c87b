//! Density Features - connection pressure around a flow
//!
//! Features:
//! - connection_rate: same_src_count / TIME_WINDOW
//! - src_aggression: same_src_count / (duration + eps)
//! - target_pressure: same_dst_count * src_load
//! - port_focus: same_src_dst_port_count / (same_src_count + 1)

use super::record::{or_zero, FlowRecord};
use super::vector::{FeatureExtractor, FeatureVector};
use crate::constants::{EPS, TIME_WINDOW};

/// Density feature extractor
#[derive(Debug, Clone)]
pub struct DensityFeatures {
    time_window: f64,
}

impl DensityFeatures {
    pub fn new() -> Self {
        Self { time_window: TIME_WINDOW }
    }
}

impl Default for DensityFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for DensityFeatures {
    fn extract(&self, record: &FlowRecord, vector: &mut FeatureVector) {
        let same_src = or_zero(record.same_src_count);

        vector.set("connection_rate", same_src / self.time_window);
        vector.set("src_aggression", same_src / (or_zero(record.duration) + EPS));
        vector.set("target_pressure", or_zero(record.same_dst_count) * or_zero(record.src_load));
        vector.set("port_focus", or_zero(record.same_src_dst_port_count) / (same_src + 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_values() {
        let record = FlowRecord {
            same_src_count: Some(50.0),
            same_dst_count: Some(3.0),
            same_src_dst_port_count: Some(17.0),
            src_load: Some(2.5),
            duration: Some(1.0),
            ..Default::default()
        };
        let mut v = FeatureVector::new();
        DensityFeatures::new().extract(&record, &mut v);

        assert_eq!(v.get("connection_rate"), Some(0.5));
        assert!((v.get("src_aggression").unwrap() - 50.0).abs() < 1e-3);
        assert_eq!(v.get("target_pressure"), Some(7.5));
        assert_eq!(v.get("port_focus"), Some(17.0 / 51.0));
    }
}
