//! Scaler - frozen standardization
//!
//! `(x - mean) / max(std, eps)` per column with population std. Columns
//! whose std is below eps output exactly 0. The state is fitted once on the
//! reference partition and has no mutating methods afterwards.

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::constants::SCALER_EPS;
use super::error::{CoreError, CoreResult};
use super::features::FeatureFrame;
use super::schema::FeatureSchema;

/// Per-column mean/std bound to a schema layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    /// Layout hash of the schema the scaler was fitted on
    pub layout_hash: u32,
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
    /// Rows used for the fit
    pub samples: usize,
}

impl ScalerState {
    /// Fit on the aligned reference matrix
    pub fn fit(schema: &FeatureSchema, reference: ArrayView2<'_, f64>) -> CoreResult<Self> {
        if reference.ncols() != schema.len() {
            return Err(CoreError::shape("scaler fit columns", schema.len(), reference.ncols()));
        }
        if reference.nrows() == 0 {
            return Err(CoreError::InvalidConfig("cannot fit scaler on an empty matrix".into()));
        }

        let mean = reference
            .mean_axis(Axis(0))
            .ok_or_else(|| CoreError::InvalidConfig("cannot fit scaler on an empty matrix".into()))?;
        // ddof = 0
        let std = reference.std_axis(Axis(0), 0.0);

        let constant = std.iter().filter(|s| **s < SCALER_EPS).count();
        if constant > 0 {
            log::warn!("{} zero-variance columns will scale to 0", constant);
        }

        log::info!(
            "Fitted scaler on {}x{} reference matrix",
            reference.nrows(),
            reference.ncols()
        );

        Ok(Self {
            layout_hash: schema.layout_hash,
            mean,
            std,
            samples: reference.nrows(),
        })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a matrix with the frozen statistics
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> CoreResult<Array2<f64>> {
        if x.ncols() != self.width() {
            return Err(CoreError::shape("scaler columns", self.width(), x.ncols()));
        }

        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            Zip::from(&mut row)
                .and(&self.mean)
                .and(&self.std)
                .for_each(|v, &m, &s| {
                    *v = if s < SCALER_EPS { 0.0 } else { (*v - m) / s.max(SCALER_EPS) };
                });
        }
        Ok(out)
    }

    /// Standardize an aligned frame, keeping its columns
    pub fn transform_frame(&self, frame: &FeatureFrame) -> CoreResult<FeatureFrame> {
        let data = self.transform(frame.view())?;
        FeatureFrame::new(frame.columns().to_vec(), data)
    }

    /// Check the scaler fits the schema it is served with
    pub fn validate(&self, schema: &FeatureSchema) -> CoreResult<()> {
        super::schema::validate_binding(schema, "scaler", self.layout_hash)?;
        if self.width() != schema.len() || self.std.len() != schema.len() {
            return Err(CoreError::shape("scaler width", schema.len(), self.width()));
        }
        if self.mean.iter().chain(self.std.iter()).any(|v| !v.is_finite()) {
            return Err(CoreError::contract_missing("scaler", "non-finite statistics"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn schema(n: usize) -> FeatureSchema {
        FeatureSchema::new((0..n).map(|i| format!("f{}", i)).collect())
    }

    #[test]
    fn test_fit_transform() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = ScalerState::fit(&schema(2), x.view()).unwrap();

        assert_eq!(scaler.mean, array![2.0, 5.0]);
        assert_eq!(scaler.std, array![1.0, 0.0]);

        let scaled = scaler.transform(x.view()).unwrap();
        assert_eq!(scaled, array![[-1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_constant_column_always_zero() {
        let scaler = ScalerState::fit(&schema(1), array![[7.0], [7.0]].view()).unwrap();
        let scaled = scaler.transform(array![[7.0], [1000.0], [-3.0]].view()).unwrap();
        assert!(scaled.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_column_mismatch() {
        let scaler = ScalerState::fit(&schema(2), array![[1.0, 2.0]].view()).unwrap();
        let result = scaler.transform(array![[1.0, 2.0, 3.0]].view());
        assert!(matches!(result, Err(CoreError::ShapeMismatch { expected: 2, actual: 3, .. })));
    }

    #[test]
    fn test_validate_binding() {
        let scaler = ScalerState::fit(&schema(2), array![[1.0, 2.0]].view()).unwrap();
        assert!(scaler.validate(&schema(2)).is_ok());
        assert!(scaler.validate(&schema(3)).is_err());
    }

    #[test]
    fn test_serde_round_trip_keeps_state() {
        let scaler = ScalerState::fit(&schema(2), array![[1.0, 2.0], [2.0, 4.0]].view()).unwrap();
        let json = serde_json::to_string(&scaler).unwrap();
        let restored: ScalerState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, scaler);
    }
}
