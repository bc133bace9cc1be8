//! Min-max feature normalization with a fit/transform split.
//!
//! Parameters are fit once on the training rows and then reused unchanged for
//! every later transform, including single tuples entered at inference time.
//!
//! ```text
//! x' = (x - min[c]) / (max[c] - min[c])
//! ```
//!
//! A column whose minimum equals its maximum is degenerate: its transformed
//! value is always `f64::NAN`. [`neutralize`] replaces that sentinel with 0.0
//! before the values reach a classifier.

use serde::{Deserialize, Serialize};

use super::{DataError, DataResult, FEATURES};

/// A feature tuple rescaled with fitted parameters.
pub type NormalizedSample = [f64; FEATURES];

/// Per-column minimum and maximum of the training set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub min: [f64; FEATURES],
    pub max: [f64; FEATURES],
}

impl NormalizationParams {
    /// Fit per-column min/max in a single pass, seeded from the first row.
    ///
    /// # Errors
    /// - `EmptyDataset` if `rows` is empty
    pub fn fit(rows: &[[f64; FEATURES]]) -> DataResult<Self> {
        let first = rows.first().ok_or(DataError::EmptyDataset)?;
        let mut min = *first;
        let mut max = *first;

        for row in &rows[1..] {
            for c in 0..FEATURES {
                min[c] = min[c].min(row[c]);
                max[c] = max[c].max(row[c]);
            }
        }

        let params = Self { min, max };
        for c in params.degenerate_columns() {
            tracing::warn!(column = c, value = min[c], "zero-width feature column");
        }
        Ok(params)
    }

    /// Fit on `rows` and transform every one of them.
    pub fn fit_transform(rows: &[[f64; FEATURES]]) -> DataResult<(Self, Vec<NormalizedSample>)> {
        let params = Self::fit(rows)?;
        let normalized = rows.iter().map(|r| params.transform(r)).collect();
        Ok((params, normalized))
    }

    /// Rescale one tuple with these parameters. Pure.
    #[must_use]
    pub fn transform(&self, row: &[f64; FEATURES]) -> NormalizedSample {
        let mut out = [0.0; FEATURES];
        for c in 0..FEATURES {
            out[c] = if self.is_degenerate(c) {
                f64::NAN
            } else {
                (row[c] - self.min[c]) / (self.max[c] - self.min[c])
            };
        }
        out
    }

    /// Whether column `c` has zero width.
    #[must_use]
    pub fn is_degenerate(&self, c: usize) -> bool {
        self.max[c] == self.min[c]
    }

    pub fn degenerate_columns(&self) -> Vec<usize> {
        (0..FEATURES).filter(|&c| self.is_degenerate(c)).collect()
    }
}

/// Replace non-finite components with 0.0 so degenerate columns contribute nothing.
#[must_use]
pub fn neutralize(sample: &NormalizedSample) -> [f64; FEATURES] {
    sample.map(|v| if v.is_finite() { v } else { 0.0 })
}
