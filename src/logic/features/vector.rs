//! Feature Vector - Core data structure for model input
//!
//! **Ordered name → value mapping**
//!
//! A `FeatureVector` keeps insertion order, which for computed vectors is
//! the order of `FEATURE_LAYOUT`. A `FeatureFrame` is a batch of vectors
//! sharing one column order, stored as an N×F matrix.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::record::FlowRecord;
use crate::logic::error::{CoreError, CoreResult};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Ordered feature vector for a single flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Build from parallel name/value lists
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut vector = Self::new();
        for (name, value) in pairs {
            vector.set(name, value);
        }
        vector
    }

    /// Insert or overwrite. New names are appended at the end.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.values[i] = value,
            None => {
                self.columns.push(name);
                self.values.push(value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.values[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter().copied())
    }
}

// ============================================================================
// FEATURE FRAME
// ============================================================================

/// Batch of feature vectors with a shared column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl FeatureFrame {
    /// Wrap a matrix; column count must match
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> CoreResult<Self> {
        if data.ncols() != columns.len() {
            return Err(CoreError::shape("frame columns", columns.len(), data.ncols()));
        }
        Ok(Self { columns, data })
    }

    /// Empty frame with the given columns
    pub fn empty(columns: Vec<String>) -> Self {
        let width = columns.len();
        Self {
            columns,
            data: Array2::zeros((0, width)),
        }
    }

    /// Stack vectors that share a column order
    pub fn from_vectors(vectors: &[FeatureVector]) -> CoreResult<Self> {
        let columns = match vectors.first() {
            Some(first) => first.columns().to_vec(),
            None => return Ok(Self::empty(Vec::new())),
        };

        let mut data = Array2::zeros((vectors.len(), columns.len()));
        for (i, vector) in vectors.iter().enumerate() {
            if vector.columns() != columns.as_slice() {
                return Err(CoreError::shape(format!("row {} columns", i), columns.len(), vector.len()));
            }
            for (j, value) in vector.values().iter().enumerate() {
                data[[i, j]] = *value;
            }
        }

        Ok(Self { columns, data })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn into_parts(self) -> (Vec<String>, Array2<f64>) {
        (self.columns, self.data)
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|j| self.data.column(j))
    }

    /// Row `i` as a standalone vector
    pub fn row_vector(&self, i: usize) -> Option<FeatureVector> {
        if i >= self.nrows() {
            return None;
        }
        let row = self.data.row(i);
        Some(FeatureVector {
            columns: self.columns.clone(),
            values: row.to_vec(),
        })
    }

    /// Append columns to the right (rows must match)
    pub fn append_columns(&mut self, names: &[&str], block: Array2<f64>) -> CoreResult<()> {
        if block.nrows() != self.nrows() {
            return Err(CoreError::shape("appended rows", self.nrows(), block.nrows()));
        }
        if block.ncols() != names.len() {
            return Err(CoreError::shape("appended columns", names.len(), block.ncols()));
        }
        self.data = ndarray::concatenate(Axis(1), &[self.data.view(), block.view()])
            .map_err(|e| CoreError::InvalidConfig(format!("cannot append columns: {}", e)))?;
        self.columns.extend(names.iter().map(|s| s.to_string()));
        Ok(())
    }
}

// ============================================================================
// FEATURE EXTRACTOR TRAIT
// ============================================================================

/// Trait for feature extractors
pub trait FeatureExtractor {
    /// Extract features from one record and append them to the vector
    fn extract(&self, record: &FlowRecord, vector: &mut FeatureVector);
}

// ============================================================================
// TESTS
// ============================================================================
