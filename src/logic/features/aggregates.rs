//! Reference Aggregates - per-source context fitted on a reference partition
//!
//! Features:
//! - node_degree: distinct destinations per source
//! - flow_rate: records per source
//! - ttl_entropy: entropy of the source's TTL distribution
//! - state_entropy: entropy of the source's connection-state distribution
//!
//! Fitted once on the training partition and then looked up by source id.
//! Sources never seen during the fit get the median of the reference values.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::layout::{layout_hash, FEATURE_VERSION};
use super::record::{or_zero, present, FlowRecord};
use super::security::distribution_entropy;
use super::vector::{FeatureExtractor, FeatureVector};
use crate::logic::error::{CoreError, CoreResult};

// ============================================================================
// AGGREGATE MAP
// ============================================================================

/// Source id → value with a median fallback for unseen sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMap {
    pub values: BTreeMap<String, f64>,
    pub fallback: f64,
}

impl AggregateMap {
    fn from_values(values: BTreeMap<String, f64>) -> Self {
        let fallback = median(values.values().copied());
        Self { values, fallback }
    }

    /// Value for a source, or the reference median
    pub fn get(&self, source: Option<&str>) -> f64 {
        source
            .and_then(|s| self.values.get(s).copied())
            .unwrap_or(self.fallback)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.values.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Median, 0 for an empty input
pub fn median<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

// ============================================================================
// REFERENCE AGGREGATES
// ============================================================================

/// Per-source aggregates frozen from the reference partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAggregates {
    pub version: u8,
    pub layout_hash: u32,
    /// Rows in the reference partition
    pub reference_rows: usize,
    pub node_degree: AggregateMap,
    pub flow_rate: AggregateMap,
    pub ttl_entropy: AggregateMap,
    pub state_entropy: AggregateMap,
}

#[derive(Default)]
struct SourceStats {
    destinations: HashSet<String>,
    flows: u32,
    ttls: HashMap<u64, u32>,
    states: HashMap<String, u32>,
}

impl ReferenceAggregates {
    /// Fit on the reference partition only.
    /// Records without a source id are skipped.
    pub fn fit(reference: &[FlowRecord]) -> CoreResult<Self> {
        if reference.is_empty() {
            return Err(CoreError::InvalidConfig(
                "reference partition is empty, cannot fit aggregates".into(),
            ));
        }

        let mut per_source: HashMap<&str, SourceStats> = HashMap::new();
        let mut skipped = 0usize;

        for record in reference {
            let Some(source) = present(&record.src_ip) else {
                skipped += 1;
                continue;
            };

            let stats = per_source.entry(source).or_default();
            stats.flows += 1;
            if let Some(dst) = present(&record.dst_ip) {
                stats.destinations.insert(dst.to_string());
            }
            *stats.ttls.entry(or_zero(record.src_ttl).to_bits()).or_insert(0) += 1;
            if let Some(state) = present(&record.conn_state) {
                *stats.states.entry(state.to_string()).or_insert(0) += 1;
            }
        }

        if skipped > 0 {
            log::warn!("Aggregate fit skipped {} records without a source id", skipped);
        }

        let mut node_degree = BTreeMap::new();
        let mut flow_rate = BTreeMap::new();
        let mut ttl_entropy = BTreeMap::new();
        let mut state_entropy = BTreeMap::new();

        for (source, stats) in &per_source {
            let key = source.to_string();
            let ttl_total = stats.ttls.values().sum();
            let state_total = stats.states.values().sum();

            node_degree.insert(key.clone(), stats.destinations.len() as f64);
            flow_rate.insert(key.clone(), stats.flows as f64);
            ttl_entropy.insert(key.clone(), distribution_entropy(stats.ttls.values().copied(), ttl_total));
            state_entropy.insert(key, distribution_entropy(stats.states.values().copied(), state_total));
        }

        let aggregates = Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            reference_rows: reference.len(),
            node_degree: AggregateMap::from_values(node_degree),
            flow_rate: AggregateMap::from_values(flow_rate),
            ttl_entropy: AggregateMap::from_values(ttl_entropy),
            state_entropy: AggregateMap::from_values(state_entropy),
        };

        log::info!(
            "Fitted reference aggregates: {} sources from {} rows",
            aggregates.source_count(),
            reference.len()
        );

        Ok(aggregates)
    }

    pub fn source_count(&self) -> usize {
        self.flow_rate.len()
    }

    /// Check the aggregates were fitted against the current layout
    pub fn validate(&self) -> CoreResult<()> {
        if self.version != FEATURE_VERSION || self.layout_hash != layout_hash() {
            return Err(CoreError::LayoutMismatch {
                expected_version: FEATURE_VERSION,
                expected_hash: layout_hash(),
                actual_version: self.version,
                actual_hash: self.layout_hash,
            });
        }
        Ok(())
    }
}

impl FeatureExtractor for ReferenceAggregates {
    fn extract(&self, record: &FlowRecord, vector: &mut FeatureVector) {
        let source = present(&record.src_ip);

        if let Some(src) = source {
            if !self.flow_rate.contains(src) {
                log::debug!("Unseen source '{}', using reference medians", src);
            }
        }

        vector.set("node_degree", self.node_degree.get(source));
        vector.set("flow_rate", self.flow_rate.get(source));
        vector.set("ttl_entropy", self.ttl_entropy.get(source));
        vector.set("state_entropy", self.state_entropy.get(source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(src: &str, dst: &str, ttl: f64, state: &str) -> FlowRecord {
        FlowRecord {
            src_ip: Some(src.into()),
            dst_ip: Some(dst.into()),
            src_ttl: Some(ttl),
            conn_state: Some(state.into()),
            ..Default::default()
        }
    }

    fn reference() -> Vec<FlowRecord> {
        vec![
            flow("a", "x", 64.0, "FIN"),
            flow("a", "y", 128.0, "CON"),
            flow("a", "x", 64.0, "FIN"),
            flow("a", "z", 128.0, "CON"),
            flow("b", "x", 64.0, "FIN"),
            flow("c", "x", 64.0, "INT"),
            flow("c", "y", 64.0, "INT"),
        ]
    }

    #[test]
    fn test_fit_values() {
        let agg = ReferenceAggregates::fit(&reference()).unwrap();

        assert_eq!(agg.source_count(), 3);
        assert_eq!(agg.node_degree.get(Some("a")), 3.0);
        assert_eq!(agg.flow_rate.get(Some("a")), 4.0);
        assert_eq!(agg.flow_rate.get(Some("c")), 2.0);
        assert!((agg.ttl_entropy.get(Some("a")) - 1.0).abs() < 1e-12);
        assert!((agg.state_entropy.get(Some("a")) - 1.0).abs() < 1e-12);
        assert_eq!(agg.state_entropy.get(Some("c")), 0.0);
    }

    #[test]
    fn test_unseen_source_gets_median() {
        let agg = ReferenceAggregates::fit(&reference()).unwrap();

        // flow_rate per source: a=4, b=1, c=2 → median 2
        assert_eq!(agg.flow_rate.get(Some("unknown")), 2.0);
        assert_eq!(agg.flow_rate.get(None), 2.0);

        let mut v = FeatureVector::new();
        agg.extract(&flow("zzz", "x", 1.0, "FIN"), &mut v);
        assert_eq!(v.get("flow_rate"), Some(2.0));
        assert_eq!(v.get("node_degree"), Some(2.0));
    }

    #[test]
    fn test_scoring_partition_does_not_change_fit() {
        let agg = ReferenceAggregates::fit(&reference()).unwrap();

        // A burst from "b" in the scored partition is invisible to the lookup
        let mut v = FeatureVector::new();
        agg.extract(&flow("b", "q", 64.0, "FIN"), &mut v);
        assert_eq!(v.get("flow_rate"), Some(1.0));
        assert_eq!(v.get("node_degree"), Some(1.0));
    }

    #[test]
    fn test_empty_reference_is_error() {
        assert!(matches!(
            ReferenceAggregates::fit(&[]),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_no_source_ids_falls_back_to_zero() {
        let agg = ReferenceAggregates::fit(&[FlowRecord::default()]).unwrap();
        assert_eq!(agg.source_count(), 0);
        assert_eq!(agg.flow_rate.get(Some("a")), 0.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(Vec::<f64>::new()), 0.0);
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), 2.5);
    }
}
