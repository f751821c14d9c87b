use ndarray::{Array1, ArrayView1};

use crate::constants::EPS;

/// Min-max normalization with a degenerate-range fallback
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub values: Array1<f64>,
    /// All inputs were equal, every value is 0.5
    pub degenerate: bool,
}

/// `(x - min) / (max - min + eps)`, or 0.5 everywhere for a constant series.
/// Expects finite input.
pub fn normalize(series: ArrayView1<'_, f64>) -> Normalized {
    if series.is_empty() {
        return Normalized {
            values: Array1::zeros(0),
            degenerate: false,
        };
    }

    let min = series.fold(f64::INFINITY, |acc, &v| acc.min(v));
    let max = series.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));

    if max == min {
        return Normalized {
            values: Array1::from_elem(series.len(), 0.5),
            degenerate: true,
        };
    }

    // Halved operands keep `max - min` finite across the whole f64 range
    let low = min / 2.0;
    let range = max / 2.0 - low + EPS / 2.0;
    Normalized {
        values: series.mapv(|v| ((v / 2.0 - low) / range).clamp(0.0, 1.0)),
        degenerate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_bounds() {
        let n = normalize(array![3.0, -1.0, 10.0, 4.5].view());
        assert!(!n.degenerate);
        assert!(n.values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(n.values[1], 0.0);
        assert!(n.values[2] > 0.999);
    }

    #[test]
    fn test_extreme_range_stays_bounded() {
        let n = normalize(array![-1e308, 0.0, 1e308].view());
        assert!(n.values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(n.values[0], 0.0);
        assert!((n.values[1] - 0.5).abs() < 1e-12);
        assert!(n.values[2] > 0.999);

        let n = normalize(array![f64::MIN, f64::MAX].view());
        assert!(n.values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_constant_series_is_half() {
        let n = normalize(array![2.0, 2.0, 2.0].view());
        assert!(n.degenerate);
        assert!(n.values.iter().all(|v| *v == 0.5));
    }

    #[test]
    fn test_empty_series() {
        let n = normalize(Array1::<f64>::zeros(0).view());
        assert!(n.values.is_empty());
        assert!(!n.degenerate);
    }
}
