//! Classifier collaborator: the capability interface the pipeline trains
//! through, and a fully-connected back-propagation network implementing it.
//!
//! ## Forward pass
//!
//! Every non-output layer carries an implicit bias input fixed at 1.0:
//! ```text
//! a^{ℓ+1} = tanh(W^ℓ [a^ℓ; 1])
//! ```
//!
//! ## Training step
//!
//! Training consumes the activations cached by the most recent forward pass:
//! ```text
//! g^L      = (t - a^L) ⊙ (1 - (a^L)²)
//! g^ℓ      = (W^ℓᵀ g^{ℓ+1})[..n_ℓ] ⊙ (1 - (a^ℓ)²)
//! ΔW^ℓ     = η g^{ℓ+1} ⊗ [a^ℓ; 1] + α ΔW^ℓ_prev
//! ```
//! where η is the learning rate and α the momentum.

use ndarray::{s, Array1, Array2, Axis};
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::Rng;
use thiserror::Error;

use crate::utils::{d_tanh_from_output, rms_error, smoothed_average, tanh};

/// Error type for classifier operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Input or target length does not match the topology
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// Invalid network configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// `train` was called before any `forward`
    #[error("no cached activations: train called before forward")]
    NoActivations,
}

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Stateful classifier trained one sample at a time.
///
/// `train` always refers to the activations cached by the most recent
/// `forward`; callers that want to correct a prediction call `train` without
/// re-running the forward pass.
pub trait Classifier {
    /// Evaluate `inputs` and cache every layer's activations.
    fn forward(&mut self, inputs: &[f64]) -> NetworkResult<()>;

    /// Apply one gradient step towards `targets` using the cached activations.
    fn train(&mut self, targets: &[f64]) -> NetworkResult<()>;

    /// Output activations from the last `forward` (empty before the first one).
    fn outputs(&self) -> Vec<f64>;

    /// Smoothed RMS error, updated by every `train`.
    fn recent_average_error(&self) -> f64;
}

/// Fully-connected tanh network trained by back-propagation with momentum.
///
/// # Architecture
///
/// - **Layers:** indexed 0 (input) to L (output), sizes given by `topology`
/// - **Weights:** `w[ℓ]` maps layer ℓ to ℓ+1, shape `(n_{ℓ+1}, n_ℓ + 1)`; the
///   last column holds the bias weights
/// - **Momentum:** `dw[ℓ]` keeps the previous update for each weight
#[derive(Clone)]
pub struct Network {
    pub(crate) topology: Vec<usize>,
    pub(crate) learning_rate: f64,
    pub(crate) momentum: f64,
    pub(crate) error_smoothing: f64,
    pub(crate) w: Vec<Array2<f64>>,
    pub(crate) dw: Vec<Array2<f64>>,
    pub(crate) recent_average_error: f64,
    /// a[ℓ]: activations cached by the last forward pass (empty before it)
    activations: Vec<Array1<f64>>,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("topology", &self.topology)
            .field("learning_rate", &self.learning_rate)
            .field("momentum", &self.momentum)
            .field("error_smoothing", &self.error_smoothing)
            .field("w", &format!("<{} weight matrices>", self.w.len()))
            .field("recent_average_error", &self.recent_average_error)
            .finish()
    }
}

impl Network {
    /// Create a network with weights drawn from the thread-local RNG.
    ///
    /// # Errors
    /// - `InvalidConfig` if the topology has fewer than 2 layers, a zero-width
    ///   layer, or a hyper-parameter is not a finite non-negative number
    pub fn new(
        topology: Vec<usize>,
        learning_rate: f64,
        momentum: f64,
        error_smoothing: f64,
    ) -> NetworkResult<Self> {
        Self::with_rng(
            topology,
            learning_rate,
            momentum,
            error_smoothing,
            &mut rand::thread_rng(),
        )
    }

    /// Create a network with weights drawn from `rng`.
    ///
    /// Uses Xavier/Glorot uniform initialization:
    /// `W ~ U(-limit, limit)` where `limit = sqrt(6 / (fan_in + fan_out))`.
    /// The bias column counts towards `fan_in`.
    pub fn with_rng<R: Rng + ?Sized>(
        topology: Vec<usize>,
        learning_rate: f64,
        momentum: f64,
        error_smoothing: f64,
        rng: &mut R,
    ) -> NetworkResult<Self> {
        validate(&topology, learning_rate, momentum, error_smoothing)?;

        let mut w = Vec::with_capacity(topology.len() - 1);
        let mut dw = Vec::with_capacity(topology.len() - 1);
        for pair in topology.windows(2) {
            let (fan_in, fan_out) = (pair[0] + 1, pair[1]);
            let limit = (6.0f64 / (fan_in + fan_out) as f64).sqrt();
            let dist = Uniform::new(-limit, limit);
            w.push(Array2::random_using((fan_out, fan_in), dist, rng));
            dw.push(Array2::zeros((fan_out, fan_in)));
        }

        Ok(Self {
            topology,
            learning_rate,
            momentum,
            error_smoothing,
            w,
            dw,
            recent_average_error: 0.0,
            activations: Vec::new(),
        })
    }

    /// Rebuild a network from stored weights, e.g. a checkpoint.
    ///
    /// # Errors
    /// - `InvalidConfig` for a bad topology or hyper-parameter
    /// - `ShapeMismatch` if any matrix does not fit the topology
    pub(crate) fn from_parts(
        topology: Vec<usize>,
        learning_rate: f64,
        momentum: f64,
        error_smoothing: f64,
        w: Vec<Array2<f64>>,
        dw: Vec<Array2<f64>>,
        recent_average_error: f64,
    ) -> NetworkResult<Self> {
        validate(&topology, learning_rate, momentum, error_smoothing)?;
        let layers = topology.len() - 1;
        if w.len() != layers || dw.len() != layers {
            return Err(NetworkError::ShapeMismatch(format!(
                "expected {} weight matrices, got {} weights and {} deltas",
                layers,
                w.len(),
                dw.len()
            )));
        }
        for (l, pair) in topology.windows(2).enumerate() {
            let expected = (pair[1], pair[0] + 1);
            if w[l].dim() != expected || dw[l].dim() != expected {
                return Err(NetworkError::ShapeMismatch(format!(
                    "layer {l}: expected {:?}, got weights {:?} and deltas {:?}",
                    expected,
                    w[l].dim(),
                    dw[l].dim()
                )));
            }
        }

        Ok(Self {
            topology,
            learning_rate,
            momentum,
            error_smoothing,
            w,
            dw,
            recent_average_error,
            activations: Vec::new(),
        })
    }

    /// Returns the layer sizes.
    pub fn topology(&self) -> &[usize] {
        &self.topology
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn error_smoothing(&self) -> f64 {
        self.error_smoothing
    }

    /// Weight matrices, one per layer transition.
    pub fn weights(&self) -> &[Array2<f64>] {
        &self.w
    }

    fn output_layer(&self) -> usize {
        self.topology.len() - 1
    }
}

impl Classifier for Network {
    fn forward(&mut self, inputs: &[f64]) -> NetworkResult<()> {
        if inputs.len() != self.topology[0] {
            return Err(NetworkError::ShapeMismatch(format!(
                "expected {} inputs, got {}",
                self.topology[0],
                inputs.len()
            )));
        }

        let mut activations = Vec::with_capacity(self.topology.len());
        activations.push(Array1::from(inputs.to_vec()));
        for w in &self.w {
            let prev = with_bias(&activations[activations.len() - 1]);
            activations.push(w.dot(&prev).mapv(tanh));
        }
        self.activations = activations;
        Ok(())
    }

    fn train(&mut self, targets: &[f64]) -> NetworkResult<()> {
        if self.activations.is_empty() {
            return Err(NetworkError::NoActivations);
        }
        let l_max = self.output_layer();
        if targets.len() != self.topology[l_max] {
            return Err(NetworkError::ShapeMismatch(format!(
                "expected {} targets, got {}",
                self.topology[l_max],
                targets.len()
            )));
        }

        let output = &self.activations[l_max];
        let error = rms_error(targets, &output.to_vec());
        self.recent_average_error =
            smoothed_average(self.recent_average_error, error, self.error_smoothing);

        // Gradients, indexed like the activations (g[0] is unused)
        let mut g: Vec<Array1<f64>> = vec![Array1::zeros(0); l_max + 1];
        let t = Array1::from(targets.to_vec());
        g[l_max] = (&t - output) * &output.mapv(d_tanh_from_output);

        for l in (1..l_max).rev() {
            // Sum of downstream contributions, dropping the bias row
            let n = self.topology[l];
            let dow = self.w[l].t().dot(&g[l + 1]);
            let grad = &dow.slice(s![..n]) * &self.activations[l].mapv(d_tanh_from_output);
            g[l] = grad;
        }

        for l in (0..l_max).rev() {
            let input = with_bias(&self.activations[l]);
            let g_col = g[l + 1].view().insert_axis(Axis(1));
            let x_row = input.view().insert_axis(Axis(0));
            let delta = self.learning_rate * (&g_col * &x_row) + self.momentum * &self.dw[l];
            self.w[l] += &delta;
            self.dw[l] = delta;
        }

        Ok(())
    }

    fn outputs(&self) -> Vec<f64> {
        self.activations
            .last()
            .map(|a| a.to_vec())
            .unwrap_or_default()
    }

    fn recent_average_error(&self) -> f64 {
        self.recent_average_error
    }
}

/// Append the constant bias input.
fn with_bias(a: &Array1<f64>) -> Array1<f64> {
    let mut v = Vec::with_capacity(a.len() + 1);
    v.extend(a.iter().copied());
    v.push(1.0);
    Array1::from(v)
}

fn validate(
    topology: &[usize],
    learning_rate: f64,
    momentum: f64,
    error_smoothing: f64,
) -> NetworkResult<()> {
    if topology.len() < 2 {
        return Err(NetworkError::InvalidConfig(
            "Must have at least 2 layers (input and output)".to_string(),
        ));
    }
    if let Some(l) = topology.iter().position(|&n| n == 0) {
        return Err(NetworkError::InvalidConfig(format!("layer {l} has no neurons")));
    }
    for (name, value) in [
        ("learning rate", learning_rate),
        ("momentum", momentum),
        ("error smoothing", error_smoothing),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(NetworkError::InvalidConfig(format!(
                "{name} must be a finite non-negative number, got {value}"
            )));
        }
    }
    Ok(())
}
