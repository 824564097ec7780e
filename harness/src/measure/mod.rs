//! Translation overhead measurement
//!
//! A [`MeasureSession`] runs the native build of a benchmark and one
//! translated build per mode, each for a fixed number of sequential trials,
//! and reports every mode's mean runtime as a slowdown against native.
//!
//! Processes are launched through the [`ProgramRunner`] trait so sessions can
//! be driven by a scripted runner in tests.

pub mod report;
pub mod runner;
pub mod session;
pub mod stats;

pub use report::{
    aggregate_geomeans, MeasurementReport, MeasurementResult, ModeGeomean, NATIVE_LABEL,
};
pub use runner::{Completion, ProcessRunner, ProgramRunner};
pub use session::{MeasureOptions, MeasureRequest, MeasureSession, RunRecord};
pub use stats::{geometric_mean, Summary};

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for measurement operations
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Errors that abort a measurement session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    /// A trial exited with an unexpected status; no sample was recorded
    #[error("{variant} trial #{trial}: exit code {code:?}, expected {expected}")]
    ExitCodeMismatch {
        variant: String,
        trial: usize,
        /// `None` when the process was killed by a signal
        code: Option<i32>,
        expected: i32,
    },

    #[error("failed to launch {variant}: {message}")]
    Launch { variant: String, message: String },

    #[error("scratch file {path}: {message}")]
    Scratch { path: PathBuf, message: String },

    #[error("{variant}: {samples} sample(s), at least 2 are needed")]
    InsufficientSamples { variant: String, samples: usize },

    #[error("native mean runtime {mean} cannot serve as a baseline")]
    DegenerateBaseline { mean: f64 },

    #[error("geometric mean of an empty list")]
    EmptyRatios,

    #[error("ratio {0} is not strictly positive")]
    NonPositiveRatio(f64),
}
