//! Training driver: sequential online passes over the dataset, plus metrics.
//!
//! Every epoch presents the rows in their original order, one at a time:
//! `forward(inputs)` then `train(target)`. There is no shuffling, no batching,
//! and no early stopping; the epoch count alone decides when training ends.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Classifier, NetworkResult};
use crate::data::{neutralize, Dataset};

/// Metrics recorded at the end of each epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch: usize,
    /// Rows presented to the classifier
    pub samples: usize,
    /// Rows forward-evaluated but not trained (no usable target)
    pub skipped: usize,
    /// Classifier's smoothed error after the epoch
    pub recent_average_error: f64,
}

/// Summary of a complete training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub forward_calls: usize,
    pub train_calls: usize,
    pub recent_average_error: f64,
}

/// Run one pass over `dataset`.
///
/// Rows without a target are still forward-evaluated, matching the call
/// order of a fully labeled set, but no training step is taken for them.
pub fn train_epoch<C: Classifier + ?Sized>(
    classifier: &mut C,
    dataset: &Dataset,
    epoch: usize,
) -> NetworkResult<EpochMetrics> {
    let mut skipped = 0;
    for (inputs, target) in dataset.inputs.iter().zip(&dataset.targets) {
        classifier.forward(&neutralize(inputs))?;
        match target {
            Some(t) => classifier.train(t.as_slice())?,
            None => skipped += 1,
        }
    }

    Ok(EpochMetrics {
        epoch,
        samples: dataset.len(),
        skipped,
        recent_average_error: classifier.recent_average_error(),
    })
}

/// Train for exactly `epochs` passes, calling `observer` after each one.
pub fn train<C, F>(
    classifier: &mut C,
    dataset: &Dataset,
    epochs: usize,
    mut observer: F,
) -> NetworkResult<TrainingReport>
where
    C: Classifier + ?Sized,
    F: FnMut(&EpochMetrics),
{
    let mut report = TrainingReport {
        epochs,
        forward_calls: 0,
        train_calls: 0,
        recent_average_error: classifier.recent_average_error(),
    };

    for epoch in 1..=epochs {
        let metrics = train_epoch(classifier, dataset, epoch)?;
        report.forward_calls += metrics.samples;
        report.train_calls += metrics.samples - metrics.skipped;
        report.recent_average_error = metrics.recent_average_error;
        observer(&metrics);
    }

    tracing::info!(
        epochs,
        forward_calls = report.forward_calls,
        train_calls = report.train_calls,
        error = report.recent_average_error,
        "training complete"
    );
    Ok(report)
}

/// Appends training events to a JSONL file, one JSON object per line.
pub struct MetricsWriter {
    out: BufWriter<File>,
}

impl MetricsWriter {
    /// Create (or truncate) the metrics file, creating parent directories.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    pub fn write_epoch(&mut self, metrics: &EpochMetrics) -> io::Result<()> {
        let event = serde_json::json!({
            "type": "epoch",
            "epoch": metrics.epoch,
            "samples": metrics.samples,
            "skipped": metrics.skipped,
            "recent_average_error": metrics.recent_average_error,
        });
        writeln!(self.out, "{event}")
    }

    pub fn write_report(&mut self, report: &TrainingReport) -> io::Result<()> {
        let event = serde_json::json!({
            "type": "training_complete",
            "epochs": report.epochs,
            "forward_calls": report.forward_calls,
            "train_calls": report.train_calls,
            "recent_average_error": report.recent_average_error,
        });
        writeln!(self.out, "{event}")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NetworkError;
    use crate::data::{EncodedTarget, NormalizationParams};

    /// Records every call; outputs are always [1, 0, 0].
    #[derive(Default)]
    struct Recorder {
        forwards: Vec<Vec<f64>>,
        trains: Vec<Vec<f64>>,
    }

    impl Classifier for Recorder {
        fn forward(&mut self, inputs: &[f64]) -> NetworkResult<()> {
            self.forwards.push(inputs.to_vec());
            Ok(())
        }

        fn train(&mut self, targets: &[f64]) -> NetworkResult<()> {
            if self.forwards.is_empty() {
                return Err(NetworkError::NoActivations);
            }
            self.trains.push(targets.to_vec());
            Ok(())
        }

        fn outputs(&self) -> Vec<f64> {
            vec![1.0, 0.0, 0.0]
        }

        fn recent_average_error(&self) -> f64 {
            self.trains.len() as f64
        }
    }

    fn dataset(targets: Vec<Option<EncodedTarget>>) -> Dataset {
        let inputs: Vec<[f64; 4]> = (0..targets.len())
            .map(|i| [i as f64 / 10.0, 0.0, 0.0, 0.0])
            .collect();
        Dataset {
            inputs,
            targets,
            params: NormalizationParams {
                min: [0.0; 4],
                max: [1.0; 4],
            },
        }
    }

    #[test]
    fn test_train_epoch_counts() {
        let mut rec = Recorder::default();
        let ds = dataset(vec![EncodedTarget::one_hot(0), None, EncodedTarget::one_hot(2)]);
        let m = train_epoch(&mut rec, &ds, 1).unwrap();
        assert_eq!(m.samples, 3);
        assert_eq!(m.skipped, 1);
        assert_eq!(rec.forwards.len(), 3);
        assert_eq!(rec.trains, vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_observer_sees_every_epoch() {
        let mut rec = Recorder::default();
        let ds = dataset(vec![EncodedTarget::one_hot(1)]);
        let mut seen = Vec::new();
        let report = train(&mut rec, &ds, 4, |m| seen.push(m.epoch)).unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(report.train_calls, 4);
        assert_eq!(report.recent_average_error, 4.0);
    }

    #[test]
    fn test_zero_epochs() {
        let mut rec = Recorder::default();
        let ds = dataset(vec![EncodedTarget::one_hot(1)]);
        let report = train(&mut rec, &ds, 0, |_| {}).unwrap();
        assert_eq!(report.forward_calls, 0);
        assert!(rec.forwards.is_empty());
    }

    #[test]
    fn test_degenerate_inputs_neutralized() {
        let mut rec = Recorder::default();
        let mut ds = dataset(vec![EncodedTarget::one_hot(0)]);
        ds.inputs[0] = [f64::NAN, 0.5, 0.5, 0.5];
        train_epoch(&mut rec, &ds, 1).unwrap();
        assert_eq!(rec.forwards[0], vec![0.0, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_metrics_writer_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("metrics.jsonl");
        let mut w = MetricsWriter::create(&path).unwrap();
        w.write_epoch(&EpochMetrics {
            epoch: 1,
            samples: 3,
            skipped: 0,
            recent_average_error: 0.25,
        })
        .unwrap();
        w.write_report(&TrainingReport {
            epochs: 1,
            forward_calls: 3,
            train_calls: 3,
            recent_average_error: 0.25,
        })
        .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "epoch");
        assert_eq!(lines[1]["type"], "training_complete");
        assert_eq!(lines[1]["train_calls"], 3);
    }
}
