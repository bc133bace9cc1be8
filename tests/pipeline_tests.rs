//! Integration tests for the load → normalize → train pipeline.
//!
//! These tests verify end-to-end behavior:
//! - The drop-last-row policy on real files
//! - Training call order against a recording classifier
//! - A real network learning a separable Iris-like dataset

use std::fs;
use std::path::Path;

use iris_feedback::data::{load_dataset, Dataset, DatasetOptions, LabelEncoder, LABELS};
use iris_feedback::{train, Classifier, Config, NetworkResult};

/// One recorded classifier call.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Forward(Vec<f64>),
    Train(Vec<f64>),
}

/// Deterministic stub: always outputs [1, 0, 0] and records every call.
#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
}

impl Recorder {
    fn count(&self, forward: bool) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Forward(_)) == forward)
            .count()
    }
}

impl Classifier for Recorder {
    fn forward(&mut self, inputs: &[f64]) -> NetworkResult<()> {
        self.calls.push(Call::Forward(inputs.to_vec()));
        Ok(())
    }

    fn train(&mut self, targets: &[f64]) -> NetworkResult<()> {
        self.calls.push(Call::Train(targets.to_vec()));
        Ok(())
    }

    fn outputs(&self) -> Vec<f64> {
        vec![1.0, 0.0, 0.0]
    }

    fn recent_average_error(&self) -> f64 {
        0.0
    }
}

/// Species centroids roughly matching the real data.
const CENTROIDS: [[f64; 4]; 3] = [
    [5.0, 3.4, 1.5, 0.2],
    [5.9, 2.8, 4.3, 1.3],
    [6.6, 3.0, 5.6, 2.0],
];

/// `n` records cycling through the species, with small deterministic jitter.
fn synthetic_records(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let class = i % 3;
            let jitter = ((i * 37 % 11) as f64 - 5.0) * 0.04;
            let f: Vec<String> = CENTROIDS[class]
                .iter()
                .enumerate()
                .map(|(c, v)| format!("{:.2}", v + if c % 2 == 0 { jitter } else { -jitter }))
                .collect();
            format!("{},{}", f.join(","), LABELS[class])
        })
        .collect()
}

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write dataset");
    path
}

#[test]
fn test_151_line_file_yields_150_samples() {
    let dir = tempfile::tempdir().unwrap();
    // 150 records, each newline-terminated, then a blank trailing line
    let mut contents = synthetic_records(150).join("\n");
    contents.push_str("\n\n");
    assert_eq!(contents.lines().count(), 151);

    let path = write_file(dir.path(), "iris.data", &contents);
    let raw = load_dataset(&path, &LabelEncoder::iris(), DatasetOptions::default()).unwrap();
    assert_eq!(raw.len(), 150);
    assert_eq!(raw.targets.len(), 150);
    assert_eq!(raw.unlabeled(), 0);

    let dataset = Dataset::from_raw(&raw).unwrap();
    assert_eq!(dataset.inputs.len(), dataset.targets.len());
}

#[test]
fn test_last_record_dropped_even_when_valid() {
    let dir = tempfile::tempdir().unwrap();
    let contents = "5.1,3.5,1.4,0.2,Iris-setosa\n\
                    7.0,3.2,4.7,1.4,Iris-versicolor\n\
                    6.3,3.3,6.0,2.5,Iris-virginica\n";
    let path = write_file(dir.path(), "iris.data", contents);

    let raw = load_dataset(&path, &LabelEncoder::iris(), DatasetOptions::default()).unwrap();
    assert_eq!(raw.len(), 2);
    assert!(raw.samples.iter().all(|s| s.features != [6.3, 3.3, 6.0, 2.5]));
}

#[test]
fn test_missing_dataset_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_dataset(
        &dir.path().join("absent.data"),
        &LabelEncoder::iris(),
        DatasetOptions::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_training_call_order() {
    let text = "0,0,0,0,Iris-setosa\n\
                1,1,1,1,Iris-versicolor\n\
                2,2,2,2,Iris-virginica\n\
                \n";
    let raw = iris_feedback::data::parse_lines(
        text.lines(),
        &LabelEncoder::iris(),
        DatasetOptions::default(),
    )
    .unwrap();
    let dataset = Dataset::from_raw(&raw).unwrap();
    assert_eq!(dataset.len(), 3);

    let mut rec = Recorder::default();
    let report = train(&mut rec, &dataset, 2, |_| {}).unwrap();

    assert_eq!(rec.count(true), 6);
    assert_eq!(rec.count(false), 6);
    assert_eq!(report.forward_calls, 6);
    assert_eq!(report.train_calls, 6);

    let row = |v: f64| Call::Forward(vec![v; 4]);
    let target = |i: usize| Call::Train(LabelEncoder::iris().encode(LABELS[i]).unwrap().as_slice().to_vec());
    let one_epoch = vec![row(0.0), target(0), row(0.5), target(1), row(1.0), target(2)];
    let expected: Vec<Call> = one_epoch.iter().chain(one_epoch.iter()).cloned().collect();
    assert_eq!(rec.calls, expected);
}

#[test]
fn test_network_learns_iris_like_data() {
    let records = synthetic_records(45);
    let text = records.join("\n");
    let options = DatasetOptions {
        drop_last: false,
        ..DatasetOptions::default()
    };
    let raw = iris_feedback::data::parse_lines(text.lines(), &LabelEncoder::iris(), options).unwrap();
    let dataset = Dataset::from_raw(&raw).unwrap();

    let config = Config {
        epochs: 300,
        ..Config::default()
    };
    let mut network = config.build_network(Some(42)).unwrap();
    let report = train(&mut network, &dataset, config.epochs, |_| {}).unwrap();
    assert_eq!(report.train_calls, 45 * 300);

    let encoder = LabelEncoder::iris();
    let mut correct = 0;
    for (inputs, target) in dataset.inputs.iter().zip(&dataset.targets) {
        network.forward(inputs).unwrap();
        let predicted = encoder.decode(&network.outputs());
        let expected = target.and_then(|t| encoder.label(t.index()));
        if predicted == expected {
            correct += 1;
        }
    }
    let accuracy = correct as f64 / dataset.len() as f64;
    assert!(accuracy >= 0.9, "training accuracy too low: {accuracy}");
    assert!(network.recent_average_error() < 0.5);
}
