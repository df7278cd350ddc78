//! Batch statistics over fully collected samples.

use crate::error::TraceError;

/// Linear-interpolation percentile (the numpy default): the rank
/// `p/100 * (n-1)` is interpolated between its two neighbouring order
/// statistics. `p` is clamped to `[0, 100]`.
pub fn percentile(values: &[f64], p: f64, metric: &str) -> Result<f64, TraceError> {
    if values.is_empty() {
        return Err(TraceError::insufficient_data(metric));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) };
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn percentile_u64(values: &[u64], p: f64, metric: &str) -> Result<f64, TraceError> {
    let as_f64: Vec<f64> = values.iter().map(|v| *v as f64).collect();
    percentile(&as_f64, p, metric)
}

pub fn median_u64(values: &[u64], metric: &str) -> Result<f64, TraceError> {
    percentile_u64(values, 50.0, metric)
}

pub fn mean_u64(values: &[u64], metric: &str) -> Result<f64, TraceError> {
    if values.is_empty() {
        return Err(TraceError::insufficient_data(metric));
    }
    let sum: u128 = values.iter().map(|v| u128::from(*v)).sum();
    Ok(sum as f64 / values.len() as f64)
}

/// `100 * part / whole`, refusing to invent a value for an empty whole.
pub fn percentage(part: u64, whole: u64, metric: &str) -> Result<f64, TraceError> {
    if whole == 0 {
        return Err(TraceError::division_undefined(metric));
    }
    Ok(100.0 * part as f64 / whole as f64)
}
