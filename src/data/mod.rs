//! Dataset loading, record parsing, label encoding, and feature normalization.
//!
//! ## Submodules
//!
//! - [`record`] — Comma-separated line → [`Sample`]
//! - [`labels`] — Species label ↔ one-hot [`EncodedTarget`]
//! - [`normalize`] — Per-column min-max fit and transform
//! - [`dataset`] — File loading with the drop-last-row policy

pub mod dataset;
pub mod labels;
pub mod normalize;
pub mod record;

use thiserror::Error;

pub use dataset::{load_dataset, parse_lines, Dataset, DatasetOptions, RawDataset};
pub use labels::{EncodedTarget, LabelEncoder, LABELS};
pub use normalize::{neutralize, NormalizationParams, NormalizedSample};
pub use record::{parse_features, parse_record, Sample};

/// Number of numeric features per record.
pub const FEATURES: usize = 4;

/// Number of classes.
pub const CLASSES: usize = 3;

/// Errors raised while reading or preparing data.
#[derive(Debug, Error)]
pub enum DataError {
    /// The dataset file could not be read
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A record did not have the expected number of fields
    #[error("line {line}: expected {expected} numeric fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// A numeric field failed to parse (strict mode only)
    #[error("column {column}: {value:?} is not a number")]
    InvalidNumber { column: usize, value: String },
    /// A label is not one of the known classes (strict mode only)
    #[error("line {line}: unknown label {label:?}")]
    UnknownLabel { line: usize, label: String },
    /// Normalization needs at least one row
    #[error("cannot fit normalization on an empty dataset")]
    EmptyDataset,
}

pub type DataResult<T> = Result<T, DataError>;
