//! Evaluation metrics for binary window predictions

use serde::{Deserialize, Serialize};

use crate::constants::PROBABILITY_EPS;

/// Binary confusion counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(probabilities: &[f64], targets: &[f64], threshold: f64) -> Self {
        let mut cm = Self::default();
        for (&p, &y) in probabilities.iter().zip(targets) {
            match (p > threshold, y >= 0.5) {
                (true, true) => cm.true_positive += 1,
                (true, false) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Mean binary cross-entropy with clamped probabilities
pub fn binary_cross_entropy(probabilities: &[f64], targets: &[f64]) -> f64 {
    if probabilities.is_empty() {
        return 0.0;
    }
    let sum: f64 = probabilities
        .iter()
        .zip(targets)
        .map(|(&p, &y)| {
            let p = p.clamp(PROBABILITY_EPS, 1.0 - PROBABILITY_EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    sum / probabilities.len() as f64
}

/// Rank-based ROC-AUC (Mann-Whitney U), ties get average ranks.
/// 0.5 when only one class is present.
pub fn roc_auc(probabilities: &[f64], targets: &[f64]) -> f64 {
    let n = probabilities.len().min(targets.len());
    let positives = targets[..n].iter().filter(|y| **y >= 0.5).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| probabilities[a].total_cmp(&probabilities[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && probabilities[order[j + 1]] == probabilities[order[i]] {
            j += 1;
        }
        // Average 1-based rank for the tie group
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = (0..n).filter(|&k| targets[k] >= 0.5).map(|k| ranks[k]).sum();
    let p = positives as f64;
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

/// Evaluation summary for a set of labelled windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub count: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub auc: f64,
    pub confusion: ConfusionMatrix,
}

impl EvaluationReport {
    pub fn compute(probabilities: &[f64], targets: &[f64], threshold: f64) -> Self {
        let confusion = ConfusionMatrix::from_predictions(probabilities, targets, threshold);
        Self {
            count: confusion.total(),
            loss: binary_cross_entropy(probabilities, targets),
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            auc: roc_auc(probabilities, targets),
            confusion,
        }
    }
}
