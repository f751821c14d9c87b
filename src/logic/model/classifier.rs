//! Classifier capability
//!
//! One `predict(input) -> ClassifierOutput` contract with two variants:
//! probabilistic classifiers over a single feature row (label + per-class
//! probabilities) and sequence classifiers over a W×F window (label + one
//! probability).

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::logic::error::{CoreError, CoreResult};
use super::network::AttentionPooledClassifier;

/// Input accepted by a classifier
#[derive(Debug, Clone, Copy)]
pub enum ClassifierInput<'a> {
    /// One aligned, scaled feature row
    Row(ArrayView1<'a, f64>),
    /// One W×F window
    Sequence(ArrayView2<'a, f64>),
}

impl ClassifierInput<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierInput::Row(_) => "row",
            ClassifierInput::Sequence(_) => "sequence",
        }
    }
}

/// Output of a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassifierOutput {
    Probabilistic { label: u8, probabilities: Vec<f64> },
    Sequence { label: u8, probability: f64 },
}

impl ClassifierOutput {
    pub fn label(&self) -> u8 {
        match self {
            ClassifierOutput::Probabilistic { label, .. } | ClassifierOutput::Sequence { label, .. } => *label,
        }
    }

    /// Probability of the positive (malicious) class
    pub fn positive_probability(&self) -> f64 {
        match self {
            ClassifierOutput::Probabilistic { probabilities, .. } => {
                probabilities.get(1).copied().unwrap_or_default()
            }
            ClassifierOutput::Sequence { probability, .. } => *probability,
        }
    }
}

/// Trait for classifiers behind the pipeline
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, input: ClassifierInput<'_>) -> CoreResult<ClassifierOutput>;
}

impl Classifier for AttentionPooledClassifier {
    fn name(&self) -> &str {
        "attention_bigru"
    }

    fn predict(&self, input: ClassifierInput<'_>) -> CoreResult<ClassifierOutput> {
        match input {
            ClassifierInput::Sequence(x) => {
                let prediction = self.predict_window(x)?;
                Ok(ClassifierOutput::Sequence {
                    label: prediction.label,
                    probability: prediction.probability,
                })
            }
            other => Err(CoreError::UnsupportedInput(format!(
                "{} expects a sequence, got a {}",
                self.name(),
                other.kind()
            ))),
        }
    }
}

/// Turn per-class scores into a probabilistic output
pub fn probabilistic_output(probabilities: Vec<f64>, threshold: f64) -> CoreResult<ClassifierOutput> {
    let label = match probabilities.len() {
        // Single sigmoid output
        1 => u8::from(probabilities[0] > threshold),
        2 => u8::from(probabilities[1] > threshold),
        n if n > 2 => {
            let best = probabilities
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            u8::try_from(best).map_err(|_| CoreError::UnsupportedInput(format!("{} classes", n)))?
        }
        _ => return Err(CoreError::UnsupportedInput("classifier produced no scores".into())),
    };

    let probabilities = if probabilities.len() == 1 {
        vec![1.0 - probabilities[0], probabilities[0]]
    } else {
        probabilities
    };

    Ok(ClassifierOutput::Probabilistic { label, probabilities })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probabilistic_output() {
        let out = probabilistic_output(vec![0.8], 0.5).unwrap();
        assert_eq!(out.label(), 1);
        assert!((out.positive_probability() - 0.8).abs() < 1e-12);

        let out = probabilistic_output(vec![0.7, 0.3], 0.5).unwrap();
        assert_eq!(out.label(), 0);

        assert!(probabilistic_output(vec![], 0.5).is_err());
    }
}
