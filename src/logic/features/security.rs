//! Security Features - application-layer indicators
//!
//! Features:
//! - http_error_flag: HTTP status >= 400
//! - unusual_cipher_flag: cipher in the weak-cipher set
//! - ssl_cert_mismatch_flag: subject and issuer both present and different
//! - dns_query_entropy: base-2 Shannon entropy of the query characters
//! - failed_conn_flag: abnormal connection state

use std::collections::HashMap;

use super::record::{or_zero, present, FlowRecord};
use super::vector::{FeatureExtractor, FeatureVector};

/// Cipher suites considered weak
pub const WEAK_CIPHERS: &[&str] = &["TLS_RSA_WITH_RC4_128_SHA", "SSL_RSA_WITH_3DES_EDE_CBC_SHA"];

/// Connection states that never completed normally
pub const ABNORMAL_STATES: &[&str] = &["OTH", "RSTO", "RSTR", "S0", "S1"];

/// Shannon entropy (base 2) over the characters of a string
pub fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, u32> = HashMap::new();
    let mut len = 0u32;
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
        len += 1;
    }
    distribution_entropy(freq.values().copied(), len)
}

/// Shannon entropy (base 2) of a frequency distribution
pub fn distribution_entropy<I: IntoIterator<Item = u32>>(counts: I, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    let mut entropy = 0.0;

    for count in counts {
        if count > 0 {
            let p = count as f64 / total;
            entropy -= p * p.log2();
        }
    }

    entropy
}

/// Security flag extractor
#[derive(Debug, Clone, Default)]
pub struct SecurityFeatures;

impl SecurityFeatures {
    pub fn new() -> Self {
        Self
    }
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

impl FeatureExtractor for SecurityFeatures {
    fn extract(&self, record: &FlowRecord, vector: &mut FeatureVector) {
        let cert_mismatch = match (present(&record.ssl_subject), present(&record.ssl_issuer)) {
            (Some(subject), Some(issuer)) => subject != issuer,
            _ => false,
        };

        let weak_cipher = present(&record.ssl_cipher).is_some_and(|c| WEAK_CIPHERS.contains(&c));
        let failed = present(&record.conn_state)
            .is_some_and(|s| ABNORMAL_STATES.iter().any(|a| a.eq_ignore_ascii_case(s)));
        let dns_entropy = present(&record.dns_query).map(shannon_entropy).unwrap_or(0.0);

        vector.set("http_error_flag", flag(or_zero(record.http_status_code) >= 400.0));
        vector.set("unusual_cipher_flag", flag(weak_cipher));
        vector.set("ssl_cert_mismatch_flag", flag(cert_mismatch));
        vector.set("dns_query_entropy", dns_entropy);
        vector.set("failed_conn_flag", flag(failed));
    }
}
