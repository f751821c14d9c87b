//! Trust engine
//!
//! Scores every row of a feature frame. Normalization is batch-relative,
//! so the scorer works on unscaled aligned features. Missing columns and
//! non-finite values never fail the batch: they default to 0 and are
//! listed in the report.

use ndarray::{Array1, Array2};

use crate::logic::error::{CoreResult, RecoveredIssue, Stage};
use crate::logic::features::FeatureFrame;
use super::normalize::normalize;
use super::types::{TrustAssessment, TrustComponents, TrustReport};
use super::weights::TrustWeights;

/// Input columns the trust dimensions read
pub const REQUIRED_COLUMNS: &[&str] = &[
    "byte_ratio",
    "packet_ratio",
    "load_diff",
    "burstiness_index",
    "inter_arrival_diff",
    "handshake_ratio",
    "ttl_state_count",
    "src_aggression",
    "target_pressure",
    "connection_rate",
    "port_focus",
    "same_src_count",
    "ttl_entropy",
    "state_entropy",
];

/// Component names in `TrustComponents::to_array` order
pub const COMPONENT_COLUMNS: &[&str] = &[
    "T_traffic",
    "T_temporal",
    "T_protocol",
    "T_interaction",
    "T_context",
    "T_direct",
    "T_indirect",
];

/// Columns appended when trust augments the model features
pub const TRUST_COLUMNS: &[&str] = &[
    "T_traffic",
    "T_temporal",
    "T_protocol",
    "T_interaction",
    "T_context",
    "T_direct",
    "T_indirect",
    "Trust_Score",
];

/// Multi-dimensional trust scorer
#[derive(Debug, Clone, Default)]
pub struct TrustScorer {
    weights: TrustWeights,
}

/// Required inputs fetched from a frame
struct Inputs<'a> {
    frame: &'a FeatureFrame,
    report: TrustReport,
}

impl<'a> Inputs<'a> {
    fn new(frame: &'a FeatureFrame) -> Self {
        Self {
            frame,
            report: TrustReport::default(),
        }
    }

    /// Column by name, 0 when absent, non-finite cells as 0
    fn column(&mut self, name: &str) -> Array1<f64> {
        match self.frame.column(name) {
            Some(col) => {
                let non_finite = col.iter().filter(|v| !v.is_finite()).count();
                if non_finite > 0 {
                    log::warn!("{} non-finite values in '{}' replaced with 0.0", non_finite, name);
                    self.report.issues.push(RecoveredIssue::NonFinite {
                        column: name.to_string(),
                        count: non_finite,
                    });
                }
                col.mapv(|v| if v.is_finite() { v } else { 0.0 })
            }
            None => {
                log::warn!("Trust input '{}' missing, defaulting to 0.0", name);
                self.report.missing_columns.push(name.to_string());
                self.report.issues.push(RecoveredIssue::MissingColumn {
                    stage: Stage::TrustScoring,
                    column: name.to_string(),
                });
                Array1::zeros(self.frame.nrows())
            }
        }
    }

    /// normalize(), recording a degenerate range under `term`
    fn norm(&mut self, term: &str, series: Array1<f64>) -> Array1<f64> {
        let normalized = normalize(series.view());
        if normalized.degenerate {
            log::debug!("Degenerate range for '{}', using 0.5", term);
            self.report.issues.push(RecoveredIssue::DegenerateRange {
                term: term.to_string(),
            });
        }
        normalized.values
    }
}

impl TrustScorer {
    /// Scorer with validated weights
    pub fn new(weights: TrustWeights) -> CoreResult<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &TrustWeights {
        &self.weights
    }

    /// Score every row of the frame
    pub fn score(&self, frame: &FeatureFrame) -> TrustReport {
        let n = frame.nrows();
        let mut inputs = Inputs::new(frame);
        if n == 0 {
            return inputs.report;
        }

        let ones = Array1::<f64>::ones(n);
        let w = &self.weights;

        // Traffic
        let byte_ratio = inputs.column("byte_ratio");
        let packet_ratio = inputs.column("packet_ratio");
        let load_diff = inputs.column("load_diff");
        let byte_term = &ones - &inputs.norm("byte_balance", byte_ratio.mapv(|v| (v - 1.0).abs()));
        let packet_term = &ones - &inputs.norm("packet_balance", packet_ratio.mapv(|v| (v - 1.0).abs()));
        let load_term = &ones - &inputs.norm("load_balance", load_diff);
        let traffic = byte_term * w.traffic.byte_balance
            + packet_term * w.traffic.packet_balance
            + load_term * w.traffic.load_balance;

        // Temporal
        let burst = inputs.column("burstiness_index");
        let inter_arrival = inputs.column("inter_arrival_diff");
        let handshake = inputs.column("handshake_ratio");
        let burst_term = &ones - &inputs.norm("burstiness", burst);
        let arrival_term = &ones - &inputs.norm("inter_arrival", inter_arrival);
        let handshake_term = &ones - &inputs.norm("handshake", handshake);
        let temporal = burst_term * w.temporal.burstiness
            + arrival_term * w.temporal.inter_arrival
            + handshake_term * w.temporal.handshake;

        // Protocol
        let ttl_state = inputs.column("ttl_state_count");
        let protocol = &ones - &inputs.norm("protocol", ttl_state);

        // Interaction
        let aggression = inputs.column("src_aggression");
        let interaction = &ones - &inputs.norm("interaction", aggression).mapv(|v| v * v);

        // Context
        let pressure = inputs.column("target_pressure")
            + &inputs.column("connection_rate")
            + &inputs.column("port_focus");
        let context = &ones - &inputs.norm("context", pressure);

        // Direct / indirect
        let same_src = inputs.column("same_src_count");
        let direct = &ones - &inputs.norm("direct", same_src);
        let entropy = inputs.column("ttl_entropy") + &inputs.column("state_entropy");
        let indirect = inputs.norm("indirect", entropy);

        let mut report = inputs.report;
        report.assessments = (0..n)
            .map(|i| {
                let components = TrustComponents {
                    traffic: traffic[i],
                    temporal: temporal[i],
                    protocol: protocol[i],
                    interaction: interaction[i],
                    context: context[i],
                    direct: direct[i],
                    indirect: indirect[i],
                };
                self.assess(components)
            })
            .collect();

        log::debug!(
            "Scored {} rows, mean trust {:.4}, {} recovered issues",
            n,
            report.mean_score(),
            report.issues.len()
        );

        report
    }

    /// Combine components into the final score
    pub fn assess(&self, components: TrustComponents) -> TrustAssessment {
        let s = &self.weights.score;
        let c = &self.weights.contextual;

        let trust_score = s.traffic * components.traffic
            + s.temporal * components.temporal
            + s.protocol * components.protocol
            + s.interaction * components.interaction
            + s.context * components.context
            + s.direct * components.direct
            + s.indirect * components.indirect;

        let contextual = c.context * components.context
            + c.protocol * components.protocol
            + c.interaction * components.interaction;

        TrustAssessment {
            components,
            contextual: contextual.clamp(0.0, 1.0),
            trust_score: trust_score.clamp(0.0, 1.0),
        }
    }

    /// Append the seven components and Trust_Score as feature columns
    pub fn augment(&self, frame: &mut FeatureFrame, report: &TrustReport) -> CoreResult<()> {
        let mut block = Array2::zeros((report.len(), TRUST_COLUMNS.len()));
        for (i, assessment) in report.assessments.iter().enumerate() {
            for (j, value) in assessment.components.to_array().iter().enumerate() {
                block[[i, j]] = *value;
            }
            block[[i, COMPONENT_COLUMNS.len()]] = assessment.trust_score;
        }
        frame.append_columns(TRUST_COLUMNS, block)
    }
}
