//! Dataset loading from a comma-separated text file.
//!
//! The last line of the file is dropped before parsing. The reference data
//! file ends with a blank line, so this removes it; the policy is applied
//! regardless of that line's content.

use std::path::Path;

use super::labels::{EncodedTarget, LabelEncoder};
use super::normalize::{NormalizationParams, NormalizedSample};
use super::record::{parse_record, Sample};
use super::{DataError, DataResult, FEATURES};

/// Parsing policy for dataset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetOptions {
    /// Turn unparsable numbers, bad rows, and unknown labels into errors.
    pub strict: bool,
    /// Drop the final line of the file before parsing.
    pub drop_last: bool,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            strict: false,
            drop_last: true,
        }
    }
}

/// Parsed rows with their encoded targets, before normalization.
///
/// `samples` and `targets` are index-aligned. A row whose label is not known
/// keeps its features but has no target.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    pub samples: Vec<Sample>,
    pub targets: Vec<Option<EncodedTarget>>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rows without a usable target.
    pub fn unlabeled(&self) -> usize {
        self.targets.iter().filter(|t| t.is_none()).count()
    }

    pub fn feature_rows(&self) -> Vec<[f64; FEATURES]> {
        self.samples.iter().map(|s| s.features).collect()
    }
}

/// Normalized training set together with the parameters it was fit with.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub inputs: Vec<NormalizedSample>,
    pub targets: Vec<Option<EncodedTarget>>,
    pub params: NormalizationParams,
}

impl Dataset {
    /// Fit normalization on every raw row and rescale them.
    ///
    /// # Errors
    /// - `EmptyDataset` if there are no rows
    pub fn from_raw(raw: &RawDataset) -> DataResult<Self> {
        let (params, inputs) = NormalizationParams::fit_transform(&raw.feature_rows())?;
        Ok(Self {
            inputs,
            targets: raw.targets.clone(),
            params,
        })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Read and parse a dataset file.
///
/// # Errors
/// - `Io` if the file cannot be read
/// - any error of [`parse_lines`]
pub fn load_dataset(
    path: &Path,
    encoder: &LabelEncoder,
    options: DatasetOptions,
) -> DataResult<RawDataset> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let raw = parse_lines(text.lines(), encoder, options)?;
    tracing::info!(
        path = %path.display(),
        samples = raw.len(),
        unlabeled = raw.unlabeled(),
        "dataset loaded"
    );
    Ok(raw)
}

/// Parse dataset lines, applying the drop-last policy first.
///
/// In lenient mode rows with the wrong number of fields are skipped and
/// unknown labels yield rows without a target; strict mode reports both.
pub fn parse_lines<'a, I>(
    lines: I,
    encoder: &LabelEncoder,
    options: DatasetOptions,
) -> DataResult<RawDataset>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lines: Vec<&str> = lines.into_iter().collect();
    if options.drop_last {
        lines.pop();
    }

    let mut raw = RawDataset::default();
    for (i, line) in lines.into_iter().enumerate() {
        let line_no = i + 1;
        let sample = match parse_record(line, line_no, options.strict) {
            Ok(s) => s,
            Err(e @ DataError::FieldCount { .. }) if !options.strict => {
                tracing::warn!("skipping row: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        let target = encoder.encode(&sample.label);
        if target.is_none() {
            if options.strict {
                return Err(DataError::UnknownLabel {
                    line: line_no,
                    label: sample.label,
                });
            }
            tracing::warn!(line = line_no, label = %sample.label, "unknown label, row has no target");
        }

        raw.samples.push(sample);
        raw.targets.push(target);
    }

    Ok(raw)
}
