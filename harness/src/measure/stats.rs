//! Sample statistics for timing data
//!
//! Every function rejects input that would divide by zero instead of
//! returning NaN or infinity.

use crate::measure::{MeasureError, MeasureResult};
use serde::{Deserialize, Serialize};

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation with Bessel's correction (divides by `n - 1`).
pub fn sample_std_dev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let m = mean(samples)?;
    let ss: f64 = samples.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (samples.len() - 1) as f64).sqrt())
}

/// Median: the middle value for odd lengths, the mean of the two middle
/// values for even lengths.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// `1 + (mean - baseline) / baseline`, i.e. `mean / baseline`.
pub fn slowdown(mean: f64, baseline: f64) -> MeasureResult<f64> {
    if baseline <= 0.0 || !baseline.is_finite() {
        return Err(MeasureError::DegenerateBaseline { mean: baseline });
    }
    Ok(1.0 + (mean - baseline) / baseline)
}

/// Standard deviation of a slowdown ratio by relative-error propagation.
pub fn slowdown_std_dev(slowdown: f64, mean: f64, sd: f64, baseline: f64, baseline_sd: f64) -> f64 {
    if mean <= 0.0 || baseline <= 0.0 {
        return 0.0;
    }
    slowdown * ((sd / mean).powi(2) + (baseline_sd / baseline).powi(2)).sqrt()
}

/// Geometric mean of strictly positive ratios.
///
/// Computed in log space so long lists of large ratios do not overflow.
pub fn geometric_mean(ratios: &[f64]) -> MeasureResult<f64> {
    if ratios.is_empty() {
        return Err(MeasureError::EmptyRatios);
    }
    if let Some(&bad) = ratios.iter().find(|r| !(**r > 0.0 && r.is_finite())) {
        return Err(MeasureError::NonPositiveRatio(bad));
    }
    let log_sum: f64 = ratios.iter().map(|r| r.ln()).sum();
    Ok((log_sum / ratios.len() as f64).exp())
}

/// Descriptive statistics of one variant's samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
}

impl Summary {
    /// Summarize `samples`; needs at least two to estimate spread.
    pub fn from_samples(variant: &str, samples: &[f64]) -> MeasureResult<Self> {
        match (mean(samples), sample_std_dev(samples), median(samples)) {
            (Some(mean), Some(std_dev), Some(median)) => Ok(Self {
                samples: samples.len(),
                mean,
                std_dev,
                median,
            }),
            _ => Err(MeasureError::InsufficientSamples {
                variant: variant.to_string(),
                samples: samples.len(),
            }),
        }
    }
}
