//! Measurement reports

use crate::measure::stats::geometric_mean;
use crate::measure::MeasureResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of the native baseline row.
pub const NATIVE_LABEL: &str = "native";

/// Statistics of one variant, relative to the native baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// `native` or a translation mode
    pub mode: String,
    /// Mean runtime in seconds
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    /// `mean / native mean`; 1.0 for the baseline itself
    pub slowdown: f64,
    pub slowdown_std_dev: f64,
}

impl fmt::Display for MeasurementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8}: {:.5} {:.5} {:.2}",
            self.mode, self.mean, self.std_dev, self.slowdown
        )
    }
}

/// Outcome of one measurement session, native row first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub benchmark: String,
    pub native: String,
    pub foreign: String,
    pub trials: usize,
    pub results: Vec<MeasurementResult>,
}

impl MeasurementReport {
    /// One formatted line per result.
    pub fn lines(&self) -> Vec<String> {
        self.results.iter().map(ToString::to_string).collect()
    }

    pub fn get(&self, mode: &str) -> Option<&MeasurementResult> {
        self.results.iter().find(|r| r.mode == mode)
    }

    /// Translated rows only.
    pub fn translated(&self) -> impl Iterator<Item = &MeasurementResult> {
        self.results.iter().filter(|r| r.mode != NATIVE_LABEL)
    }
}

impl fmt::Display for MeasurementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "{result}")?;
        }
        Ok(())
    }
}

/// Geometric mean slowdown of one mode across benchmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeGeomean {
    pub mode: String,
    pub geomean: f64,
    pub benchmarks: usize,
}

impl fmt::Display for ModeGeomean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8}: {:.2} ({} benchmarks)", self.mode, self.geomean, self.benchmarks)
    }
}

/// Per-mode geometric mean of slowdowns over several reports, modes in order
/// of first appearance.
pub fn aggregate_geomeans(reports: &[MeasurementReport]) -> MeasureResult<Vec<ModeGeomean>> {
    let mut modes: Vec<(&str, Vec<f64>)> = Vec::new();
    for result in reports.iter().flat_map(|r| r.translated()) {
        match modes.iter_mut().find(|(m, _)| *m == result.mode) {
            Some((_, ratios)) => ratios.push(result.slowdown),
            None => modes.push((result.mode.as_str(), vec![result.slowdown])),
        }
    }

    modes
        .into_iter()
        .map(|(mode, ratios)| {
            Ok(ModeGeomean {
                mode: mode.to_string(),
                geomean: geometric_mean(&ratios)?,
                benchmarks: ratios.len(),
            })
        })
        .collect()
}
