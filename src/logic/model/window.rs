//! Sequence Windower - fixed-width windows over an ordered feature matrix
//!
//! Window `i` covers rows `[i, i + W)` and is labelled with row `i + W`,
//! so N rows yield N - W windows. `N <= W` is an explicit error.
//! `ChunkedWindower` carries the last W rows between chunks so chunked
//! and one-shot windowing emit the same sequences.

use ndarray::{concatenate, s, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::error::{CoreError, CoreResult};

// ============================================================================
// SEQUENCE
// ============================================================================

/// W×F input window with an optional one-step-ahead label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    data: Array2<f64>,
    label: Option<f64>,
}

impl Sequence {
    /// Wrap a W×F matrix; row count must equal the window
    pub fn new(data: Array2<f64>, window: usize, label: Option<f64>) -> CoreResult<Self> {
        if data.nrows() != window {
            return Err(CoreError::shape("sequence rows", window, data.nrows()));
        }
        Ok(Self { data, label })
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn label(&self) -> Option<f64> {
        self.label
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }
}

/// Probability and hard label for one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub probability: f64,
    pub label: u8,
}

// ============================================================================
// WINDOWER
// ============================================================================

/// Slides a fixed-width window over rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceWindower {
    window: usize,
}

impl SequenceWindower {
    pub fn new(window: usize) -> CoreResult<Self> {
        if window == 0 {
            return Err(CoreError::InvalidConfig("window must be > 0".into()));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of windows for `rows` rows
    pub fn sequence_count(&self, rows: usize) -> usize {
        rows.saturating_sub(self.window)
    }

    fn check_rows(&self, rows: usize) -> CoreResult<usize> {
        match self.sequence_count(rows) {
            0 => Err(CoreError::InsufficientRows {
                rows,
                window: self.window,
            }),
            n => Ok(n),
        }
    }

    /// Lazy W×F views over the matrix
    pub fn windows<'a>(
        &self,
        matrix: ArrayView2<'a, f64>,
    ) -> CoreResult<impl Iterator<Item = ArrayView2<'a, f64>> + 'a> {
        let count = self.check_rows(matrix.nrows())?;
        let w = self.window;
        Ok((0..count).map(move |i| matrix.slice_move(s![i..i + w, ..])))
    }

    /// Lazy views paired with the label of row `i + W`
    pub fn windows_labeled<'a>(
        &self,
        matrix: ArrayView2<'a, f64>,
        labels: ArrayView1<'a, f64>,
    ) -> CoreResult<impl Iterator<Item = (ArrayView2<'a, f64>, f64)> + 'a> {
        if labels.len() != matrix.nrows() {
            return Err(CoreError::shape("labels", matrix.nrows(), labels.len()));
        }
        let w = self.window;
        Ok(self
            .windows(matrix)?
            .enumerate()
            .map(move |(i, view)| (view, labels[i + w])))
    }

    /// Owned sequences, labelled when labels are given
    pub fn sequences(
        &self,
        matrix: ArrayView2<'_, f64>,
        labels: Option<ArrayView1<'_, f64>>,
    ) -> CoreResult<Vec<Sequence>> {
        if let Some(labels) = labels {
            if labels.len() != matrix.nrows() {
                return Err(CoreError::shape("labels", matrix.nrows(), labels.len()));
            }
        }

        let w = self.window;
        self.windows(matrix)?
            .enumerate()
            .map(|(i, view)| Sequence::new(view.to_owned(), w, labels.map(|l| l[i + w])))
            .collect()
    }

    /// Chunked generator with the same output as `sequences`
    pub fn chunked(&self) -> ChunkedWindower {
        ChunkedWindower {
            window: self.window,
            carry: None,
            carry_labels: Vec::new(),
            rows_seen: 0,
            emitted: 0,
        }
    }
}

// ============================================================================
// CHUNKED WINDOWER
// ============================================================================

/// Bounded-memory windowing over consecutive row chunks
#[derive(Debug, Clone)]
pub struct ChunkedWindower {
    window: usize,
    carry: Option<Array2<f64>>,
    carry_labels: Vec<Option<f64>>,
    rows_seen: usize,
    emitted: usize,
}

impl ChunkedWindower {
    /// Feed the next chunk and return the windows it completes
    pub fn push(
        &mut self,
        chunk: ArrayView2<'_, f64>,
        labels: Option<ArrayView1<'_, f64>>,
    ) -> CoreResult<Vec<Sequence>> {
        if let Some(labels) = labels {
            if labels.len() != chunk.nrows() {
                return Err(CoreError::shape("chunk labels", chunk.nrows(), labels.len()));
            }
        }

        let buffer = match self.carry.take() {
            Some(carry) => {
                if carry.ncols() != chunk.ncols() {
                    return Err(CoreError::shape("chunk columns", carry.ncols(), chunk.ncols()));
                }
                concatenate(Axis(0), &[carry.view(), chunk.view()])
                    .map_err(|e| CoreError::InvalidConfig(format!("cannot join chunks: {}", e)))?
            }
            None => chunk.to_owned(),
        };

        let mut buffer_labels = std::mem::take(&mut self.carry_labels);
        match labels {
            Some(l) => buffer_labels.extend(l.iter().map(|v| Some(*v))),
            None => buffer_labels.extend(std::iter::repeat(None).take(chunk.nrows())),
        }
        self.rows_seen += chunk.nrows();

        let w = self.window;
        let count = buffer.nrows().saturating_sub(w);
        let mut sequences = Vec::with_capacity(count);
        for i in 0..count {
            let view = buffer.slice(s![i..i + w, ..]);
            sequences.push(Sequence::new(view.to_owned(), w, buffer_labels[i + w])?);
        }
        self.emitted += count;

        // Keep the trailing W rows
        let keep_from = buffer.nrows().saturating_sub(w);
        self.carry = Some(buffer.slice(s![keep_from.., ..]).to_owned());
        self.carry_labels = buffer_labels.split_off(keep_from);

        Ok(sequences)
    }

    /// Close the stream; no window at all is an error
    pub fn finish(self) -> CoreResult<usize> {
        if self.emitted == 0 {
            return Err(CoreError::InsufficientRows {
                rows: self.rows_seen,
                window: self.window,
            });
        }
        Ok(self.emitted)
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn matrix(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| (i * 10 + j) as f64)
    }

    #[test]
    fn test_twenty_five_rows_window_twenty() {
        let windower = SequenceWindower::new(20).unwrap();
        let m = matrix(25, 3);

        let windows: Vec<_> = windower.windows(m.view()).unwrap().collect();
        assert_eq!(windows.len(), 5);
        assert!(windows.iter().all(|w| w.dim() == (20, 3)));
        assert_eq!(windows[4][[0, 0]], 40.0);
    }

    #[test]
    fn test_too_few_rows() {
        let windower = SequenceWindower::new(20).unwrap();

        for rows in [10, 20] {
            let m = matrix(rows, 2);
            let result = windower.windows(m.view());
            assert!(matches!(result, Err(CoreError::InsufficientRows { window: 20, .. })));
        }
        assert_eq!(windower.sequence_count(10), 0);
    }

    #[test]
    fn test_labels_are_one_step_ahead() {
        let windower = SequenceWindower::new(3).unwrap();
        let m = matrix(6, 2);
        let labels = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0, 0.0, 1.0]);

        let sequences = windower.sequences(m.view(), Some(labels.view())).unwrap();
        let got: Vec<_> = sequences.iter().map(|s| s.label()).collect();
        assert_eq!(got, vec![Some(1.0), Some(0.0), Some(1.0)]);

        let labeled: Vec<_> = windower.windows_labeled(m.view(), labels.view()).unwrap().collect();
        assert_eq!(labeled[0].1, 1.0);
    }

    #[test]
    fn test_chunked_matches_unchunked() {
        let windower = SequenceWindower::new(4).unwrap();
        let m = matrix(23, 2);
        let labels = Array1::from_shape_fn(23, |i| (i % 2) as f64);
        let expected = windower.sequences(m.view(), Some(labels.view())).unwrap();

        // Uneven chunks including ones shorter than the window
        let bounds = [0, 3, 5, 12, 13, 23];
        let mut chunked = windower.chunked();
        let mut got = Vec::new();
        for pair in bounds.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let chunk = m.slice(s![a..b, ..]);
            let chunk_labels = labels.slice(s![a..b]);
            got.extend(chunked.push(chunk, Some(chunk_labels)).unwrap());
        }

        assert_eq!(chunked.finish().unwrap(), expected.len());
        assert_eq!(got, expected);
    }

    #[test]
    fn test_chunked_insufficient() {
        let windower = SequenceWindower::new(5).unwrap();
        let mut chunked = windower.chunked();
        assert!(chunked.push(matrix(3, 2).view(), None).unwrap().is_empty());
        assert!(chunked.push(matrix(2, 2).view(), None).unwrap().is_empty());
        assert!(matches!(
            chunked.finish(),
            Err(CoreError::InsufficientRows { rows: 5, window: 5 })
        ));
    }

    #[test]
    fn test_sequence_length_invariant() {
        assert!(Sequence::new(matrix(3, 2), 4, None).is_err());
        assert_eq!(Sequence::new(matrix(4, 2), 4, None).unwrap().len(), 4);
    }
}
