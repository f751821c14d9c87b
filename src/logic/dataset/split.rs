//! Chronological train / validation / test split

use serde::{Deserialize, Serialize};

use crate::logic::error::{CoreError, CoreResult};
use crate::logic::features::FlowRecord;

/// Fractions of the corpus for train and validation; test gets the rest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.70,
            validation: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn validate(&self) -> CoreResult<()> {
        let valid = self.train > 0.0
            && self.validation >= 0.0
            && self.train + self.validation <= 1.0;
        if !valid {
            return Err(CoreError::InvalidConfig(format!(
                "invalid split ratios: train {} validation {}",
                self.train, self.validation
            )));
        }
        Ok(())
    }
}

/// Three time-ordered partitions; `train` is the reference partition
#[derive(Debug, Clone, Default)]
pub struct ChronologicalSplit {
    pub train: Vec<FlowRecord>,
    pub validation: Vec<FlowRecord>,
    pub test: Vec<FlowRecord>,
}

impl ChronologicalSplit {
    /// Stable sort by timestamp, then cut at the ratio boundaries.
    ///
    /// Records without a timestamp sort first and keep their relative order,
    /// so a corpus without timestamps is split in input order.
    pub fn split(mut records: Vec<FlowRecord>, ratios: SplitRatios) -> CoreResult<Self> {
        ratios.validate()?;

        records.sort_by_key(|r| r.timestamp.unwrap_or(i64::MIN));

        let n = records.len();
        let train_end = boundary(n, ratios.train);
        let validation_end = (train_end + boundary(n, ratios.validation)).min(n);

        let test = records.split_off(validation_end);
        let validation = records.split_off(train_end);

        log::info!(
            "Chronological split: {} train / {} validation / {} test",
            records.len(),
            validation.len(),
            test.len()
        );

        Ok(Self {
            train: records,
            validation,
            test,
        })
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// floor(n * ratio), tolerant of ratios like 0.7 that are inexact in binary
fn boundary(n: usize, ratio: f64) -> usize {
    (n as f64 * ratio + 1e-9).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: Option<i64>, bytes: f64) -> FlowRecord {
        FlowRecord {
            timestamp: ts,
            src_bytes: Some(bytes),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_split_sizes() {
        let records: Vec<_> = (0..100).map(|i| record(Some(i), i as f64)).collect();
        let split = ChronologicalSplit::split(records, SplitRatios::default()).unwrap();

        assert_eq!(split.train.len(), 70);
        assert_eq!(split.validation.len(), 15);
        assert_eq!(split.test.len(), 15);
    }

    #[test]
    fn test_split_is_time_ordered() {
        let records: Vec<_> = (0..20).rev().map(|i| record(Some(i * 10), i as f64)).collect();
        let split = ChronologicalSplit::split(records, SplitRatios::default()).unwrap();

        let last_train = split.train.last().unwrap().timestamp.unwrap();
        let first_validation = split.validation.first().unwrap().timestamp.unwrap();
        let first_test = split.test.first().unwrap().timestamp.unwrap();
        assert!(last_train < first_validation);
        assert!(split.validation.last().unwrap().timestamp.unwrap() < first_test);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records: Vec<_> = (0..10).map(|i| record(None, i as f64)).collect();
        let split = ChronologicalSplit::split(records, SplitRatios::default()).unwrap();

        let bytes: Vec<f64> = split.train.iter().map(|r| r.src_bytes.unwrap()).collect();
        assert_eq!(bytes, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_invalid_ratios() {
        let ratios = SplitRatios {
            train: 0.9,
            validation: 0.2,
        };
        assert!(matches!(
            ChronologicalSplit::split(Vec::new(), ratios),
            Err(CoreError::InvalidConfig(_))
        ));
    }
}
