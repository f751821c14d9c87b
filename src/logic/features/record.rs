//! Flow Record - raw per-flow telemetry
//!
//! Accepts both the canonical field names and the UNSW-NB15 column names.
//! Every field is optional; absent numeric fields read as 0.

use serde::{Deserialize, Serialize};

/// One observed network flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowRecord {
    // Identifiers
    #[serde(alias = "srcip")]
    pub src_ip: Option<String>,
    #[serde(alias = "dstip")]
    pub dst_ip: Option<String>,
    /// Flow start time (epoch seconds), used for chronological splits
    #[serde(alias = "stime", alias = "Stime")]
    pub timestamp: Option<i64>,

    // Volume
    #[serde(alias = "sbytes")]
    pub src_bytes: Option<f64>,
    #[serde(alias = "dbytes")]
    pub dst_bytes: Option<f64>,
    #[serde(alias = "Spkts", alias = "spkts")]
    pub src_pkts: Option<f64>,
    #[serde(alias = "Dpkts", alias = "dpkts")]
    pub dst_pkts: Option<f64>,
    #[serde(alias = "dur")]
    pub duration: Option<f64>,

    // Timing
    #[serde(alias = "Sjit", alias = "sjit")]
    pub src_jitter: Option<f64>,
    #[serde(alias = "Djit", alias = "djit")]
    pub dst_jitter: Option<f64>,
    #[serde(alias = "Sintpkt", alias = "sinpkt")]
    pub src_inter_pkt: Option<f64>,
    #[serde(alias = "Dintpkt", alias = "dinpkt")]
    pub dst_inter_pkt: Option<f64>,
    #[serde(alias = "Sload", alias = "sload")]
    pub src_load: Option<f64>,
    #[serde(alias = "Dload", alias = "dload")]
    pub dst_load: Option<f64>,
    pub synack: Option<f64>,
    #[serde(alias = "tcprtt")]
    pub tcp_rtt: Option<f64>,

    // Protocol
    #[serde(alias = "sttl")]
    pub src_ttl: Option<f64>,
    #[serde(alias = "dttl")]
    pub dst_ttl: Option<f64>,
    #[serde(alias = "state")]
    pub conn_state: Option<String>,

    // Connection-count context
    #[serde(alias = "ct_state_ttl")]
    pub ttl_state_count: Option<f64>,
    #[serde(alias = "ct_src_ltm", alias = "ct_src_ ltm")]
    pub same_src_count: Option<f64>,
    #[serde(alias = "ct_dst_ltm")]
    pub same_dst_count: Option<f64>,
    #[serde(alias = "ct_src_dport_ltm")]
    pub same_src_dst_port_count: Option<f64>,

    // Application metadata
    pub http_status_code: Option<f64>,
    pub ssl_cipher: Option<String>,
    pub ssl_subject: Option<String>,
    pub ssl_issuer: Option<String>,
    pub dns_query: Option<String>,

    /// Ground truth (training / evaluation only)
    #[serde(alias = "Label")]
    pub label: Option<u8>,
}

/// Missing or non-finite numeric field reads as 0
pub(crate) fn or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Zeek writes "-" for unset string fields
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_unsw_names() {
        let json = r#"{
            "srcip": "10.0.0.1", "dstip": "10.0.0.2",
            "sbytes": 1000, "dbytes": 500, "Spkts": 10, "Dpkts": 5,
            "dur": 0.5, "Sjit": 2.0, "Sintpkt": 1.0,
            "state": "FIN", "ct_src_ ltm": 7, "ct_state_ttl": 2, "Label": 1
        }"#;
        let record: FlowRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.src_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.src_bytes, Some(1000.0));
        assert_eq!(record.dst_pkts, Some(5.0));
        assert_eq!(record.same_src_count, Some(7.0));
        assert_eq!(record.ttl_state_count, Some(2.0));
        assert_eq!(record.conn_state.as_deref(), Some("FIN"));
        assert_eq!(record.label, Some(1));
        assert_eq!(record.dst_load, None);
    }

    #[test]
    fn test_deserialize_canonical_names() {
        let json = r#"{"src_bytes": 10, "same_src_count": 3, "ssl_cipher": "TLS_RSA_WITH_RC4_128_SHA"}"#;
        let record: FlowRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.src_bytes, Some(10.0));
        assert_eq!(record.same_src_count, Some(3.0));
        assert!(record.ssl_cipher.is_some());
    }

    #[test]
    fn test_or_zero_and_present() {
        assert_eq!(or_zero(None), 0.0);
        assert_eq!(or_zero(Some(f64::NAN)), 0.0);
        assert_eq!(or_zero(Some(3.5)), 3.5);

        assert_eq!(present(&Some("-".to_string())), None);
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&Some("CN=a".to_string())), Some("CN=a"));
    }
}
