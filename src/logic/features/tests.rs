//! Integration Tests for Feature Computation
//!
//! Checks the extractors together produce the full layout in order.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use crate::logic::features::{
        layout::{AGGREGATE_COLUMNS, FEATURE_COUNT, FEATURE_LAYOUT},
        FeatureComputer, FlowRecord, ReferenceAggregates,
    };

    fn sample(src: &str, sbytes: f64) -> FlowRecord {
        FlowRecord {
            src_ip: Some(src.into()),
            dst_ip: Some("10.0.0.254".into()),
            src_bytes: Some(sbytes),
            dst_bytes: Some(200.0),
            src_pkts: Some(10.0),
            dst_pkts: Some(4.0),
            duration: Some(0.25),
            src_jitter: Some(3.0),
            src_inter_pkt: Some(1.5),
            same_src_count: Some(12.0),
            same_dst_count: Some(2.0),
            conn_state: Some("FIN".into()),
            src_ttl: Some(64.0),
            ..Default::default()
        }
    }

    /// Full computer emits every layout column in layout order
    #[test]
    fn test_full_layout_with_aggregates() {
        let records = vec![sample("a", 100.0), sample("b", 300.0)];
        let aggregates = Arc::new(ReferenceAggregates::fit(&records).unwrap());
        let computer = FeatureComputer::with_aggregates(aggregates);

        let vector = computer.compute(&records[0]);
        assert_eq!(vector.len(), FEATURE_COUNT);
        let names: Vec<&str> = vector.columns().iter().map(String::as_str).collect();
        assert_eq!(names, FEATURE_LAYOUT);
    }

    /// Without aggregates the four aggregate columns are omitted
    #[test]
    fn test_layout_without_aggregates() {
        let computer = FeatureComputer::new();
        let vector = computer.compute(&sample("a", 100.0));

        assert_eq!(vector.len(), FEATURE_COUNT - AGGREGATE_COLUMNS.len());
        for col in AGGREGATE_COLUMNS {
            assert!(!vector.contains(col));
        }
        assert_eq!(computer.columns(), vector.columns());
    }

    /// Batch and single-record computation agree
    #[test]
    fn test_compute_batch_matches_compute() {
        let records: Vec<_> = (0..5).map(|i| sample("a", 100.0 * i as f64)).collect();
        let computer = FeatureComputer::new();

        let frame = computer.compute_batch(&records).unwrap();
        assert_eq!(frame.nrows(), 5);

        for (i, record) in records.iter().enumerate() {
            assert_eq!(frame.row_vector(i).unwrap(), computer.compute(record));
        }
    }

    /// An empty record never produces non-finite values
    #[test]
    fn test_empty_record_is_finite() {
        let aggregates = Arc::new(ReferenceAggregates::fit(&[sample("a", 1.0)]).unwrap());
        let vector = FeatureComputer::with_aggregates(aggregates).compute(&FlowRecord::default());

        assert!(vector.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_batch() {
        let frame = FeatureComputer::new().compute_batch(&[]).unwrap();
        assert_eq!(frame.nrows(), 0);
        assert_eq!(frame.ncols(), FEATURE_COUNT - AGGREGATE_COLUMNS.len());
    }
}
