//! Species labels and their one-hot encoding.
//!
//! Lookup is exact: no case folding, no trimming, no fuzzy matching.

use std::collections::HashMap;

use super::CLASSES;
use crate::utils::argmax;

/// Known labels in canonical (one-hot position) order.
pub const LABELS: [&str; CLASSES] = ["Iris-setosa", "Iris-versicolor", "Iris-virginica"];

/// One-hot target vector: exactly one entry is 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedTarget([f64; CLASSES]);

impl EncodedTarget {
    /// Target with a 1.0 at `index`, or `None` if out of range.
    #[must_use]
    pub fn one_hot(index: usize) -> Option<Self> {
        if index >= CLASSES {
            return None;
        }
        let mut v = [0.0; CLASSES];
        v[index] = 1.0;
        Some(Self(v))
    }

    /// Position of the 1.0 entry.
    #[must_use]
    pub fn index(&self) -> usize {
        // a one-hot vector always has a maximum
        argmax(&self.0).unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Label-to-index mapping for one-hot encoding.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    labels: Vec<&'static str>,
    label_to_idx: HashMap<&'static str, usize>,
}

impl LabelEncoder {
    /// Encoder over the three Iris species.
    #[must_use]
    pub fn iris() -> Self {
        let labels = LABELS.to_vec();
        let label_to_idx = labels.iter().enumerate().map(|(i, &l)| (l, i)).collect();
        Self {
            labels,
            label_to_idx,
        }
    }

    /// Number of known labels.
    #[must_use]
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.label_to_idx.get(label).copied()
    }

    #[must_use]
    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.labels.get(index).copied()
    }

    /// One-hot encode a label; `None` if it is not a known label.
    #[must_use]
    pub fn encode(&self, label: &str) -> Option<EncodedTarget> {
        self.index_of(label).and_then(EncodedTarget::one_hot)
    }

    /// Decode a one-hot (or score) vector back to a label using argmax.
    #[must_use]
    pub fn decode(&self, scores: &[f64]) -> Option<&'static str> {
        argmax(scores).and_then(|i| self.label(i))
    }
}

impl Default for LabelEncoder {
    fn default() -> Self {
        Self::iris()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_size() {
        assert_eq!(LabelEncoder::iris().size(), 3);
    }

    #[test]
    fn test_label_round_trip() {
        let enc = LabelEncoder::iris();
        for (i, label) in LABELS.iter().enumerate() {
            let target = enc.encode(label).expect("known label");
            assert_eq!(target.index(), i);
            assert_eq!(target.as_slice().iter().sum::<f64>(), 1.0);
            assert_eq!(enc.decode(target.as_slice()), Some(*label));
        }
    }

    #[test]
    fn test_setosa_encoding() {
        let enc = LabelEncoder::iris();
        assert_eq!(enc.encode("Iris-setosa").unwrap().as_slice(), &[1.0, 0.0, 0.0]);
        assert_eq!(enc.encode("Iris-virginica").unwrap().as_slice(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_label() {
        let enc = LabelEncoder::iris();
        for label in ["", "iris-setosa", "IRIS-SETOSA", " Iris-setosa", "Iris-setosa\r", "setosa"] {
            assert_eq!(enc.encode(label), None, "{label:?} should not encode");
        }
    }

    #[test]
    fn test_one_hot_out_of_range() {
        assert_eq!(EncodedTarget::one_hot(3), None);
        assert_eq!(LabelEncoder::iris().label(3), None);
    }

    #[test]
    fn test_decode_scores() {
        let enc = LabelEncoder::iris();
        assert_eq!(enc.decode(&[0.1, 0.2, 0.9]), Some("Iris-virginica"));
        assert_eq!(enc.decode(&[]), None);
    }
}
