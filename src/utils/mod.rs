//! Math utilities: activation, error metrics, and smoothing.

/// Activation function: tanh.
#[inline]
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Derivative of tanh expressed in terms of its output `y = tanh(x)`.
///
/// The network caches post-activation values, so the derivative is taken
/// from the output rather than recomputing `tanh` of the pre-activation sum.
#[inline]
pub fn d_tanh_from_output(y: f64) -> f64 {
    1.0 - y * y
}

/// Root-mean-square difference between `targets` and `outputs`.
///
/// Returns 0.0 for empty slices. Extra elements of the longer slice are ignored.
pub fn rms_error(targets: &[f64], outputs: &[f64]) -> f64 {
    let n = targets.len().min(outputs.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = targets
        .iter()
        .zip(outputs)
        .map(|(t, y)| (t - y) * (t - y))
        .sum();
    (sum / n as f64).sqrt()
}

/// Running average that weighs the history by `smoothing` samples.
///
/// ```text
/// avg' = (avg * smoothing + sample) / (smoothing + 1)
/// ```
#[inline]
pub fn smoothed_average(avg: f64, sample: f64, smoothing: f64) -> f64 {
    (avg * smoothing + sample) / (smoothing + 1.0)
}

/// Index of the largest element, ignoring NaNs. `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}
