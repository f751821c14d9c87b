//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the computed feature order**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The schema captured at training time starts from this order, so a
//! silent reorder here would desynchronize every persisted scaler/model.

use crc32fast::Hasher;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order FeatureComputer emits them
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Raw pass-through (0-19) ===
    "src_bytes",
    "dst_bytes",
    "src_pkts",
    "dst_pkts",
    "duration",
    "src_jitter",
    "dst_jitter",
    "src_inter_pkt",
    "dst_inter_pkt",
    "src_load",
    "dst_load",
    "synack",
    "tcp_rtt",
    "src_ttl",
    "dst_ttl",
    "http_status_code",
    "ttl_state_count",
    "same_src_count",
    "same_dst_count",
    "same_src_dst_port_count",

    // === Structural (20-27) ===
    "byte_ratio",            // 20: src_bytes / (dst_bytes + 1)
    "packet_ratio",          // 21: src_pkts / (dst_pkts + 1)
    "packet_diff",           // 22: src_pkts - dst_pkts
    "avg_pkt_size_src",      // 23: src_bytes / (src_pkts + 1)
    "avg_pkt_size_dst",      // 24: dst_bytes / (dst_pkts + 1)
    "bytes_per_sec",         // 25: total bytes / duration (0 if duration == 0)
    "pkts_per_sec",          // 26: total packets / duration (0 if duration == 0)
    "pkt_byte_asymmetry",    // 27: |sb - db| / (sb + db + eps)

    // === Temporal (28-31) ===
    "burstiness_index",      // 28: jitter / (inter_pkt + eps)
    "load_diff",             // 29: |src_load - dst_load|
    "inter_arrival_diff",    // 30: |src_inter_pkt - dst_inter_pkt|
    "handshake_ratio",       // 31: synack / (tcp_rtt + eps)

    // === Density (32-35) ===
    "connection_rate",       // 32: same_src_count / TIME_WINDOW
    "src_aggression",        // 33: same_src_count / (duration + eps)
    "target_pressure",       // 34: same_dst_count * src_load
    "port_focus",            // 35: same_src_dst_port_count / (same_src_count + 1)

    // === Security flags (36-40) ===
    "http_error_flag",       // 36: status >= 400
    "unusual_cipher_flag",   // 37: weak cipher suite
    "ssl_cert_mismatch_flag",// 38: subject != issuer
    "dns_query_entropy",     // 39: base-2 Shannon entropy
    "failed_conn_flag",      // 40: abnormal connection state

    // === Reference aggregates (41-44) ===
    "node_degree",           // 41: distinct destinations per source
    "flow_rate",             // 42: records per source
    "ttl_entropy",           // 43: entropy of source TTL distribution
    "state_entropy",         // 44: entropy of source state distribution
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 45;

/// Columns filled from reference aggregates (absent until fitted)
pub const AGGREGATE_COLUMNS: &[&str] = &["node_degree", "flow_rate", "ttl_entropy", "state_entropy"];

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version + ordered column names
pub fn hash_columns<S: AsRef<str>>(version: u8, columns: &[S]) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[version]);

    for name in columns {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Hash of the compiled-in layout
pub fn layout_hash() -> u32 {
    hash_columns(FEATURE_VERSION, FEATURE_LAYOUT)
}
