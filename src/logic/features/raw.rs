//! Raw Features - numeric pass-through
//!
//! Copies the raw numeric fields of a flow into the vector.
//! Missing or non-finite values are written as 0.

use super::record::{or_zero, FlowRecord};
use super::vector::{FeatureExtractor, FeatureVector};

/// Raw field pass-through extractor
#[derive(Debug, Clone, Default)]
pub struct RawFeatures;

impl RawFeatures {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureExtractor for RawFeatures {
    fn extract(&self, record: &FlowRecord, vector: &mut FeatureVector) {
        let fields = [
            ("src_bytes", record.src_bytes),
            ("dst_bytes", record.dst_bytes),
            ("src_pkts", record.src_pkts),
            ("dst_pkts", record.dst_pkts),
            ("duration", record.duration),
            ("src_jitter", record.src_jitter),
            ("dst_jitter", record.dst_jitter),
            ("src_inter_pkt", record.src_inter_pkt),
            ("dst_inter_pkt", record.dst_inter_pkt),
            ("src_load", record.src_load),
            ("dst_load", record.dst_load),
            ("synack", record.synack),
            ("tcp_rtt", record.tcp_rtt),
            ("src_ttl", record.src_ttl),
            ("dst_ttl", record.dst_ttl),
            ("http_status_code", record.http_status_code),
            ("ttl_state_count", record.ttl_state_count),
            ("same_src_count", record.same_src_count),
            ("same_dst_count", record.same_dst_count),
            ("same_src_dst_port_count", record.same_src_dst_port_count),
        ];

        for (name, value) in fields {
            vector.set(name, or_zero(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_zero() {
        let record = FlowRecord {
            src_bytes: Some(100.0),
            dst_load: Some(f64::INFINITY),
            ..Default::default()
        };
        let mut vector = FeatureVector::new();
        RawFeatures::new().extract(&record, &mut vector);

        assert_eq!(vector.len(), 20);
        assert_eq!(vector.get("src_bytes"), Some(100.0));
        assert_eq!(vector.get("dst_bytes"), Some(0.0));
        assert_eq!(vector.get("dst_load"), Some(0.0));
    }
}
