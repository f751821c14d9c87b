//! Structural Features - directional volume balance
//!
//! Features:
//! - byte_ratio: src_bytes / (dst_bytes + 1)
//! - packet_ratio: src_pkts / (dst_pkts + 1)
//! - packet_diff: src_pkts - dst_pkts
//! - avg_pkt_size_src / avg_pkt_size_dst: bytes per packet per direction
//! - bytes_per_sec / pkts_per_sec: throughput (0 when duration is 0)
//! - pkt_byte_asymmetry: |sb - db| / (sb + db + eps)

use super::record::{or_zero, FlowRecord};
use super::vector::{FeatureExtractor, FeatureVector};
use crate::constants::EPS;

/// Structural feature extractor
#[derive(Debug, Clone, Default)]
pub struct StructuralFeatures;

impl StructuralFeatures {
    pub fn new() -> Self {
        Self
    }
}

/// Rate over duration, 0 when the flow has no duration
fn per_second(total: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        total / duration
    } else {
        0.0
    }
}

impl FeatureExtractor for StructuralFeatures {
    fn extract(&self, record: &FlowRecord, vector: &mut FeatureVector) {
        let sb = or_zero(record.src_bytes);
        let db = or_zero(record.dst_bytes);
        let sp = or_zero(record.src_pkts);
        let dp = or_zero(record.dst_pkts);
        let duration = or_zero(record.duration);

        vector.set("byte_ratio", sb / (db + 1.0));
        vector.set("packet_ratio", sp / (dp + 1.0));
        vector.set("packet_diff", sp - dp);
        vector.set("avg_pkt_size_src", sb / (sp + 1.0));
        vector.set("avg_pkt_size_dst", db / (dp + 1.0));
        vector.set("bytes_per_sec", per_second(sb + db, duration));
        vector.set("pkts_per_sec", per_second(sp + dp, duration));
        vector.set("pkt_byte_asymmetry", (sb - db).abs() / (sb + db + EPS));
    }
}
