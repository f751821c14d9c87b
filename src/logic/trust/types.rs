use serde::{Deserialize, Serialize};

use crate::logic::error::RecoveredIssue;

/// Seven sub-trust dimensions of one row, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustComponents {
    #[serde(rename = "T_traffic")]
    pub traffic: f64,
    #[serde(rename = "T_temporal")]
    pub temporal: f64,
    #[serde(rename = "T_protocol")]
    pub protocol: f64,
    #[serde(rename = "T_interaction")]
    pub interaction: f64,
    #[serde(rename = "T_context")]
    pub context: f64,
    #[serde(rename = "T_direct")]
    pub direct: f64,
    #[serde(rename = "T_indirect")]
    pub indirect: f64,
}

impl TrustComponents {
    /// Values in `COMPONENT_COLUMNS` order
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.traffic,
            self.temporal,
            self.protocol,
            self.interaction,
            self.context,
            self.direct,
            self.indirect,
        ]
    }
}

/// Per-row trust output
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustAssessment {
    #[serde(flatten)]
    pub components: TrustComponents,
    /// Context/protocol/interaction blend, reported only
    #[serde(rename = "T_contextual")]
    pub contextual: f64,
    #[serde(rename = "Trust_Score")]
    pub trust_score: f64,
}

/// Trust scoring result for a frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustReport {
    pub assessments: Vec<TrustAssessment>,
    /// Required columns that were absent and defaulted to 0
    pub missing_columns: Vec<String>,
    pub issues: Vec<RecoveredIssue>,
}

impl TrustReport {
    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.assessments.iter().map(|a| a.trust_score).collect()
    }

    pub fn mean_score(&self) -> f64 {
        if self.assessments.is_empty() {
            return 0.0;
        }
        self.assessments.iter().map(|a| a.trust_score).sum::<f64>() / self.assessments.len() as f64
    }
}
