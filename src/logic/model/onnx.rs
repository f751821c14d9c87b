//! ONNX Probabilistic Classifier (feature `onnx`)
//!
//! Runs an externally exported tabular model over one aligned feature row.
//! The session is held behind a mutex since `Session::run` needs `&mut`.

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use crate::logic::error::{CoreError, CoreResult};
use super::classifier::{probabilistic_output, Classifier, ClassifierInput, ClassifierOutput};

/// Tabular classifier backed by ONNX Runtime
pub struct OnnxClassifier {
    session: Mutex<Session>,
    output_name: String,
    input_dim: usize,
    threshold: f64,
    model_path: String,
}

fn onnx_error(what: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::contract_missing("onnx model", format!("{}: {}", what, e))
}

impl OnnxClassifier {
    /// Load an ONNX model file
    pub fn load(path: &Path, input_dim: usize, threshold: f64) -> CoreResult<Self> {
        log::info!("Loading ONNX model from: {}", path.display());

        if !path.exists() {
            return Err(CoreError::contract_missing(path.display().to_string(), "file not found"));
        }

        let session = Session::builder()
            .map_err(|e| onnx_error("Failed to create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| onnx_error("Failed to set optimization", e))?
            .commit_from_file(path)
            .map_err(|e| onnx_error("Failed to load model", e))?;

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| onnx_error("No output defined", path.display()))?;

        log::info!("ONNX model loaded successfully (output '{}')", output_name);

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            input_dim,
            threshold,
            model_path: path.display().to_string(),
        })
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx_tabular"
    }

    fn predict(&self, input: ClassifierInput<'_>) -> CoreResult<ClassifierOutput> {
        let row = match input {
            ClassifierInput::Row(row) => row,
            other => {
                return Err(CoreError::UnsupportedInput(format!(
                    "{} expects a row, got a {}",
                    self.name(),
                    other.kind()
                )))
            }
        };
        if row.len() != self.input_dim {
            return Err(CoreError::shape("onnx input", self.input_dim, row.len()));
        }

        let input_array = Array2::<f32>::from_shape_fn((1, row.len()), |(_, j)| row[j] as f32);
        let input_tensor = Value::from_array(input_array).map_err(|e| onnx_error("Tensor error", e))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| onnx_error("Inference failed", e))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| onnx_error("No output", &self.output_name))?;
        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| onnx_error("Extract error", e))?;

        let probabilities: Vec<f64> = output_tensor.1.iter().map(|v| f64::from(*v)).collect();
        probabilistic_output(probabilities, self.threshold)
    }
}
