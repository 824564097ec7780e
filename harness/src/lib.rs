//! xbench harness library
//!
//! This library provides:
//! - Static descriptors for target architectures, translation modes and benchmarks
//! - A build-graph generator that expands a benchmark suite into build, translate,
//!   run, test and measure tasks, validated before being serialized as a Makefile
//! - A measurement engine that times native and translated variants of a benchmark
//!   and reports their slowdown against the native baseline
//!
//! # Data flow
//!
//! ```text
//! Config + ArchSet + ModeSet + Suite
//!              ↓
//!          Generator ──→ TaskGraph ──→ validate ──→ Makefile / JSON
//!                                                      ↓
//!                                               make (external)
//!                                                      ↓
//!                                   built binaries ──→ MeasureSession ──→ report
//! ```
//!
//! Everything that depends on the process environment is resolved once in
//! [`Config::from_env`]; the generator and the measurement engine only ever see
//! the resulting immutable [`Config`].

pub mod arch;
pub mod bench;
pub mod config;
pub mod graph;
pub mod measure;
pub mod mode;

pub use arch::{ArchSet, Architecture, BuildOptions};
pub use bench::{Benchmark, Phase, RoundTrip, Suite, TranslationPair};
pub use config::{BuildType, Config, ConfigError, ConfigResult, Dirs, Tools};
pub use graph::{Generator, GraphError, GraphResult, Task, TaskGraph, TaskKind, Variant};
pub use measure::{
    geometric_mean, Completion, MeasureError, MeasureOptions, MeasureRequest, MeasureResult,
    MeasureSession, MeasurementReport, MeasurementResult, ProcessRunner, ProgramRunner,
    RunRecord,
};
pub use mode::{ModeError, ModeSet, TranslationMode};
