//! Checkpoint save/load for trained classifiers.
//!
//! Serializes the network weights, momentum deltas, and hyper-parameters to
//! JSON together with the normalization parameters the network was trained
//! on, so a resumed session transforms inputs exactly like the original one.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::{Network, NetworkError};
use crate::data::{NormalizationParams, CLASSES, FEATURES};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed checkpoint: {0}")]
    Format(#[from] serde_json::Error),
    #[error("checkpoint does not describe a valid network: {0}")]
    Network(#[from] NetworkError),
}

/// Serializable checkpoint data.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointData {
    /// Network layer sizes.
    pub topology: Vec<usize>,
    pub learning_rate: f64,
    pub momentum: f64,
    pub error_smoothing: f64,
    /// Weight matrices as nested Vec for serialization.
    pub weights: Vec<Vec<Vec<f64>>>,
    /// Previous weight updates, kept so momentum carries over.
    pub deltas: Vec<Vec<Vec<f64>>>,
    pub recent_average_error: f64,
    /// Min-max parameters fitted on the training set.
    pub normalization: NormalizationParams,
    /// Epochs completed when the checkpoint was written.
    pub epochs_trained: usize,
}

/// Convert an Array2 to Vec<Vec<f64>> for serialization.
fn array2_to_vecs(arr: &Array2<f64>) -> Vec<Vec<f64>> {
    arr.rows().into_iter().map(|row| row.to_vec()).collect()
}

/// Convert Vec<Vec<f64>> back to Array2.
fn vecs_to_array2(vecs: &[Vec<f64>]) -> Result<Array2<f64>, NetworkError> {
    if vecs.is_empty() {
        return Ok(Array2::zeros((0, 0)));
    }
    let nrows = vecs.len();
    let ncols = vecs[0].len();
    let flat: Vec<f64> = vecs.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| NetworkError::ShapeMismatch(format!("ragged weight matrix: {e}")))
}

/// Save a network and its normalization parameters to a JSON file.
///
/// Parent directories are created as needed.
pub fn save_checkpoint(
    network: &Network,
    normalization: &NormalizationParams,
    epochs_trained: usize,
    path: &Path,
) -> Result<(), CheckpointError> {
    let data = CheckpointData {
        topology: network.topology.clone(),
        learning_rate: network.learning_rate,
        momentum: network.momentum,
        error_smoothing: network.error_smoothing,
        weights: network.w.iter().map(array2_to_vecs).collect(),
        deltas: network.dw.iter().map(array2_to_vecs).collect(),
        recent_average_error: network.recent_average_error,
        normalization: *normalization,
        epochs_trained,
    };

    let json = serde_json::to_string_pretty(&data)?;

    let io_err = |source: std::io::Error| CheckpointError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, json).map_err(io_err)?;

    tracing::info!(path = %path.display(), epochs_trained, "checkpoint saved");
    Ok(())
}

/// Load a checkpoint written by [`save_checkpoint`].
///
/// # Errors
/// - `Io` if the file cannot be read
/// - `Format` for malformed JSON
/// - `Network` if the stored network does not classify Iris tuples or its
///   matrices do not fit the stored topology
pub fn load_checkpoint(path: &Path) -> Result<(CheckpointData, Network), CheckpointError> {
    let json = std::fs::read_to_string(path).map_err(|source| CheckpointError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let data: CheckpointData = serde_json::from_str(&json)?;

    if data.topology.first() != Some(&FEATURES) || data.topology.last() != Some(&CLASSES) {
        return Err(NetworkError::InvalidConfig(format!(
            "topology {:?} must take {FEATURES} inputs and produce {CLASSES} outputs",
            data.topology
        ))
        .into());
    }

    let w = data
        .weights
        .iter()
        .map(|m| vecs_to_array2(m))
        .collect::<Result<Vec<_>, _>>()?;
    let dw = data
        .deltas
        .iter()
        .map(|m| vecs_to_array2(m))
        .collect::<Result<Vec<_>, _>>()?;

    let network = Network::from_parts(
        data.topology.clone(),
        data.learning_rate,
        data.momentum,
        data.error_smoothing,
        w,
        dw,
        data.recent_average_error,
    )?;

    tracing::info!(path = %path.display(), epochs = data.epochs_trained, "checkpoint loaded");
    Ok((data, network))
}
