//! Measurement sessions
//!
//! Trials run strictly one after another: one trial of one variant at a time,
//! the calling thread blocked until the child exits. There is no timeout, so a
//! hung benchmark blocks the session.

use crate::config::{Config, DEFAULT_TRIALS, MIN_TRIALS};
use crate::graph::Variant;
use crate::measure::report::{MeasurementReport, MeasurementResult};
use crate::measure::runner::ProgramRunner;
use crate::measure::stats::{self, Summary};
use crate::measure::{MeasureError, MeasureResult};
use crate::mode::ModeSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// What to measure: which benchmark, where its binaries live, and which
/// variants to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureRequest {
    /// Directory holding the built binaries
    pub dir: PathBuf,
    pub bench: String,
    /// Arguments passed to every variant
    pub args: Vec<String>,
    /// Prefix of the native architecture (`x86`)
    pub native: String,
    /// Prefix of the foreign architecture (`rv32`)
    pub foreign: String,
    pub modes: ModeSet,
}

impl MeasureRequest {
    pub fn new(dir: impl Into<PathBuf>, bench: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            bench: bench.into(),
            args: Vec::new(),
            native: "x86".to_string(),
            foreign: "rv32".to_string(),
            modes: ModeSet::default(),
        }
    }

    /// Arguments are trimmed; make passes them through with stray whitespace.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args = args.into_iter().map(|a| a.as_ref().trim().to_string()).collect();
        self
    }

    pub fn with_native(mut self, prefix: impl Into<String>) -> Self {
        self.native = prefix.into();
        self
    }

    pub fn with_foreign(mut self, prefix: impl Into<String>) -> Self {
        self.foreign = prefix.into();
        self
    }

    pub fn with_modes(mut self, modes: ModeSet) -> Self {
        self.modes = modes;
        self
    }

    /// Native first, then one translated variant per mode.
    pub fn variants(&self) -> Vec<Variant> {
        std::iter::once(Variant::native(&self.native))
            .chain(
                self.modes
                    .iter()
                    .map(|mode| Variant::translated(&self.foreign, &self.native, mode)),
            )
            .collect()
    }
}

/// How to run the trials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureOptions {
    /// File redirected to every trial's standard input
    pub stdin: Option<PathBuf>,
    /// Log each command line and trial time at info level
    pub verbose: bool,
    pub exp_rc: i32,
    pub trials: usize,
    /// Directory receiving per-trial stdout files
    pub scratch: PathBuf,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            stdin: None,
            verbose: false,
            exp_rc: 0,
            trials: DEFAULT_TRIALS,
            scratch: std::env::temp_dir(),
        }
    }
}

impl MeasureOptions {
    /// Trial count and scratch directory from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            trials: config.trials,
            scratch: config.dirs.scratch.clone(),
            ..Self::default()
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<PathBuf>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_exp_rc(mut self, exp_rc: i32) -> Self {
        self.exp_rc = exp_rc;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_scratch(mut self, scratch: impl Into<PathBuf>) -> Self {
        self.scratch = scratch.into();
        self
    }
}

/// One completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub variant: String,
    pub trial: usize,
    pub elapsed_secs: f64,
    pub exit_code: Option<i32>,
}

/// Runs every variant of one benchmark and computes the report.
pub struct MeasureSession<'r, R: ProgramRunner + ?Sized> {
    request: MeasureRequest,
    options: MeasureOptions,
    runner: &'r R,
    records: Vec<RunRecord>,
}

impl<'r, R: ProgramRunner + ?Sized> MeasureSession<'r, R> {
    pub fn new(request: MeasureRequest, options: MeasureOptions, runner: &'r R) -> Self {
        Self {
            request,
            options,
            runner,
            records: Vec::new(),
        }
    }

    /// Trials completed so far, in execution order.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Run all trials and build the report.
    ///
    /// The first trial with an unexpected exit code aborts the session; no
    /// report is produced from partial data.
    pub fn run(&mut self) -> MeasureResult<MeasurementReport> {
        let variants = self.request.variants();
        if self.options.trials < MIN_TRIALS {
            return Err(MeasureError::InsufficientSamples {
                variant: variants[0].output_name(&self.request.bench),
                samples: self.options.trials,
            });
        }
        std::fs::create_dir_all(&self.options.scratch).map_err(|e| MeasureError::Scratch {
            path: self.options.scratch.clone(),
            message: e.to_string(),
        })?;

        info!(
            benchmark = %self.request.bench,
            variants = variants.len(),
            trials = self.options.trials,
            "Starting measurement session"
        );

        let mut summaries = Vec::with_capacity(variants.len());
        for variant in &variants {
            let samples = self.time_variant(variant)?;
            let name = variant.output_name(&self.request.bench);
            summaries.push((variant.label(), Summary::from_samples(&name, &samples)?));
        }

        // Native comes first, so a degenerate baseline fails before any mode.
        let (_, native) = summaries[0];

        let mut results = Vec::with_capacity(summaries.len());
        for (i, (label, summary)) in summaries.into_iter().enumerate() {
            let slowdown = stats::slowdown(summary.mean, native.mean)?;
            let slowdown_std_dev = if i == 0 {
                0.0
            } else {
                stats::slowdown_std_dev(
                    slowdown,
                    summary.mean,
                    summary.std_dev,
                    native.mean,
                    native.std_dev,
                )
            };
            results.push(MeasurementResult {
                mode: label.to_string(),
                mean: summary.mean,
                std_dev: summary.std_dev,
                median: summary.median,
                slowdown,
                slowdown_std_dev,
            });
        }

        Ok(MeasurementReport {
            benchmark: self.request.bench.clone(),
            native: self.request.native.clone(),
            foreign: self.request.foreign.clone(),
            trials: self.options.trials,
            results,
        })
    }

    fn time_variant(&mut self, variant: &Variant) -> MeasureResult<Vec<f64>> {
        let name = variant.output_name(&self.request.bench);
        let mut argv = Vec::with_capacity(self.request.args.len() + 1);
        argv.push(self.request.dir.join(&name).display().to_string());
        argv.extend(self.request.args.iter().cloned());

        if self.options.verbose {
            info!(variant = %name, command = %argv.join(" "), "Measuring");
        } else {
            debug!(variant = %name, command = %argv.join(" "), "Measuring");
        }

        let mut samples = Vec::with_capacity(self.options.trials);
        for trial in 0..self.options.trials {
            let stdout = self.options.scratch.join(format!("{name}-{trial}.out"));

            let done = self
                .runner
                .run(&argv, self.options.stdin.as_deref(), &stdout)
                .map_err(|e| MeasureError::Launch {
                    variant: name.clone(),
                    message: e.to_string(),
                })?;
            let code = done.code;
            let elapsed = done.elapsed.as_secs_f64();

            if code != Some(self.options.exp_rc) {
                return Err(MeasureError::ExitCodeMismatch {
                    variant: name,
                    trial,
                    code,
                    expected: self.options.exp_rc,
                });
            }

            if self.options.verbose {
                info!(variant = %name, trial, elapsed_secs = elapsed, "Trial finished");
            } else {
                debug!(variant = %name, trial, elapsed_secs = elapsed, "Trial finished");
            }
            self.records.push(RunRecord {
                variant: name.clone(),
                trial,
                elapsed_secs: elapsed,
                exit_code: code,
            });
            samples.push(elapsed);
        }
        Ok(samples)
    }
}
