use serde::{Deserialize, Serialize};

use crate::logic::error::{CoreError, CoreResult};

const SUM_TOLERANCE: f64 = 1e-9;

/// Traffic balance terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficWeights {
    pub byte_balance: f64,
    pub packet_balance: f64,
    pub load_balance: f64,
}

/// Temporal regularity terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalWeights {
    pub burstiness: f64,
    pub inter_arrival: f64,
    pub handshake: f64,
}

/// Combination of the seven components into Trust_Score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub traffic: f64,
    pub temporal: f64,
    pub protocol: f64,
    pub interaction: f64,
    pub context: f64,
    pub direct: f64,
    pub indirect: f64,
}

/// Combination into the reported T_contextual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextualWeights {
    pub context: f64,
    pub protocol: f64,
    pub interaction: f64,
}

/// Immutable trust weighting, validated at construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustWeights {
    pub traffic: TrafficWeights,
    pub temporal: TemporalWeights,
    pub score: ScoreWeights,
    pub contextual: ContextualWeights,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            traffic: TrafficWeights {
                byte_balance: 0.4,
                packet_balance: 0.3,
                load_balance: 0.3,
            },
            temporal: TemporalWeights {
                burstiness: 0.4,
                inter_arrival: 0.3,
                handshake: 0.3,
            },
            score: ScoreWeights {
                traffic: 0.15,
                temporal: 0.15,
                protocol: 0.20,
                interaction: 0.20,
                context: 0.15,
                direct: 0.10,
                indirect: 0.05,
            },
            contextual: ContextualWeights {
                context: 0.4,
                protocol: 0.3,
                interaction: 0.3,
            },
        }
    }
}

fn check_group(name: &str, weights: &[f64]) -> CoreResult<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(CoreError::InvalidConfig(format!(
            "{} weights must be finite and non-negative",
            name
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(CoreError::InvalidConfig(format!(
            "{} weights sum to {}, expected 1",
            name, sum
        )));
    }
    Ok(())
}

impl TrustWeights {
    pub fn validate(&self) -> CoreResult<()> {
        let t = &self.traffic;
        check_group("traffic", &[t.byte_balance, t.packet_balance, t.load_balance])?;

        let t = &self.temporal;
        check_group("temporal", &[t.burstiness, t.inter_arrival, t.handshake])?;

        let s = &self.score;
        check_group(
            "score",
            &[s.traffic, s.temporal, s.protocol, s.interaction, s.context, s.direct, s.indirect],
        )?;

        let c = &self.contextual;
        check_group("contextual", &[c.context, c.protocol, c.interaction])
    }
}
