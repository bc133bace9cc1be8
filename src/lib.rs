//! # iris-feedback
//!
//! Iris species classification with online feedback.
//!
//! ## Overview
//!
//! A labeled comma-separated dataset is parsed, its features are min-max
//! normalized, and a small feed-forward network is trained one sample at a
//! time for a fixed number of epochs. An interactive loop then classifies
//! tuples typed by the user; when the user says a prediction was wrong, the
//! corrected label trains the network one more step.
//!
//! The normalization parameters are fit once on the training set and reused
//! unchanged for every interactive input.
//!
//! ## Structure
//!
//! - [`data`] — Record parsing, label encoding, normalization, dataset loading
//! - [`core`] — The [`Classifier`] interface and the back-propagation [`Network`]
//! - [`training`] — Training driver and epoch metrics
//! - [`interactive`] — Classification/correction state machine
//! - [`checkpoint`] — JSON persistence of a trained network and its normalization
//! - [`utils`] — Activation, error metrics, smoothing

pub mod checkpoint;
pub mod core;
pub mod data;
pub mod interactive;
pub mod training;
pub mod utils;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use crate::core::{Classifier, Network, NetworkError, NetworkResult};
pub use data::{DataError, Dataset, DatasetOptions, EncodedTarget, LabelEncoder, NormalizationParams};
pub use interactive::{Session, SessionError, SessionSummary, State};
pub use training::{train, train_epoch, EpochMetrics, MetricsWriter, TrainingReport};

/// Network shape and training schedule.
///
/// The default is the reference configuration: a `[4, 4, 3]` network trained
/// for 5000 epochs with learning rate 0.15, momentum 0.5, and an error
/// smoothing factor of 150.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub topology: Vec<usize>,
    pub epochs: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub error_smoothing: f64,
    pub dataset: DatasetOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topology: vec![data::FEATURES, 4, data::CLASSES],
            epochs: 5000,
            learning_rate: 0.15,
            momentum: 0.5,
            error_smoothing: 150.0,
            dataset: DatasetOptions::default(),
        }
    }
}

impl Config {
    /// Build an untrained network for this configuration.
    ///
    /// With a `seed` the initial weights are reproducible.
    pub fn build_network(&self, seed: Option<u64>) -> NetworkResult<Network> {
        match seed {
            Some(seed) => Network::with_rng(
                self.topology.clone(),
                self.learning_rate,
                self.momentum,
                self.error_smoothing,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => Network::new(
                self.topology.clone(),
                self.learning_rate,
                self.momentum,
                self.error_smoothing,
            ),
        }
    }
}
