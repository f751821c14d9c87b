//! Temporal Features - timing behaviour of a flow
//!
//! Features:
//! - burstiness_index: src_jitter / (src_inter_pkt + eps)
//! - load_diff: |src_load - dst_load|
//! - inter_arrival_diff: |src_inter_pkt - dst_inter_pkt|
//! - handshake_ratio: synack / (tcp_rtt + eps)

use super::record::{or_zero, FlowRecord};
use super::vector::{FeatureExtractor, FeatureVector};
use crate::constants::EPS;

/// Temporal feature extractor
#[derive(Debug, Clone, Default)]
pub struct TemporalFeatures;

impl TemporalFeatures {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureExtractor for TemporalFeatures {
    fn extract(&self, record: &FlowRecord, vector: &mut FeatureVector) {
        let src_inter = or_zero(record.src_inter_pkt);
        let dst_inter = or_zero(record.dst_inter_pkt);

        vector.set("burstiness_index", or_zero(record.src_jitter) / (src_inter + EPS));
        vector.set("load_diff", (or_zero(record.src_load) - or_zero(record.dst_load)).abs());
        vector.set("inter_arrival_diff", (src_inter - dst_inter).abs());
        vector.set("handshake_ratio", or_zero(record.synack) / (or_zero(record.tcp_rtt) + EPS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_values() {
        let record = FlowRecord {
            src_jitter: Some(4.0),
            src_inter_pkt: Some(2.0),
            dst_inter_pkt: Some(5.0),
            src_load: Some(10.0),
            dst_load: Some(30.0),
            ..Default::default()
        };
        let mut v = FeatureVector::new();
        TemporalFeatures::new().extract(&record, &mut v);

        assert!((v.get("burstiness_index").unwrap() - 2.0).abs() < 1e-5);
        assert_eq!(v.get("load_diff"), Some(20.0));
        assert_eq!(v.get("inter_arrival_diff"), Some(3.0));
        assert_eq!(v.get("handshake_ratio"), Some(0.0));
    }
}
