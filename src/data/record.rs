//! Record parsing: one comma-separated line into features and a label.
//!
//! Numeric fields fail open by default: a field that does not parse becomes
//! `0.0`. Strict parsing turns the same condition into an error.

use super::{DataError, DataResult, FEATURES};

/// One parsed dataset row: `FEATURES` numbers plus the raw label.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: [f64; FEATURES],
    pub label: String,
}

/// Parse a dataset line of the form `f0,f1,f2,f3,label`.
///
/// `line_no` is only used for error reporting.
///
/// # Errors
/// - `FieldCount` if the line does not hold exactly `FEATURES` numbers and a label
/// - `InvalidNumber` for an unparsable number when `strict` is set
pub fn parse_record(line: &str, line_no: usize, strict: bool) -> DataResult<Sample> {
    let mut fields: Vec<&str> = line.split(',').collect();
    // split always yields at least one element
    let label = fields.pop().unwrap_or_default().to_string();

    if fields.len() != FEATURES {
        return Err(DataError::FieldCount {
            line: line_no,
            expected: FEATURES,
            found: fields.len(),
        });
    }

    let values = parse_features(&fields, strict)?;
    let mut features = [0.0; FEATURES];
    features.copy_from_slice(&values);

    Ok(Sample { features, label })
}

/// Parse every field as `f64`.
///
/// Fields are trimmed first. In lenient mode an unparsable field becomes
/// `0.0`; the arity is left to the caller to check.
pub fn parse_features(fields: &[&str], strict: bool) -> DataResult<Vec<f64>> {
    fields
        .iter()
        .enumerate()
        .map(|(column, raw)| {
            let raw = raw.trim();
            match raw.parse::<f64>() {
                Ok(v) => Ok(v),
                Err(_) if strict => Err(DataError::InvalidNumber {
                    column,
                    value: raw.to_string(),
                }),
                Err(_) => {
                    tracing::debug!(column, value = raw, "unparsable number, using 0.0");
                    Ok(0.0)
                }
            }
        })
        .collect()
}
