//! Build graph generation
//!
//! The generator expands a [`Suite`](crate::bench::Suite) into a typed
//! [`TaskGraph`]. The graph is validated (unique names, resolved dependencies,
//! no cycles) before any serializer sees it, so a malformed descriptor never
//! produces partial output.
//!
//! # Naming
//!
//! ```text
//! <dstdir>/<p>-<bench>                   native build     (file)
//! <dstdir>/<f>-<n>-<bench>-<mode>        translated build (file)
//! <p>-<bench>-run, <p>-<bench>-test      per-variant run / test
//! <f>-<n>-<bench>-<mode>-run             ...
//! <bench>, <bench>-run, <bench>-test, <bench>-measure   aliases
//! all, clean, benchs, benchs-test, benchs-measure       top level
//! ```

pub mod generator;
pub mod makefile;
pub mod naming;
pub mod recipes;
pub mod round_trip;
pub mod task;

pub use generator::Generator;
pub use makefile::{render_json, render_makefile, MakefileHeader};
pub use naming::Variant;
pub use task::{Task, TaskGraph, TaskKind};

use crate::bench::TemplateError;
use crate::mode::ModeError;
use thiserror::Error;

/// Result type alias for graph generation
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors detected while generating or validating a task graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("benchmark `{benchmark}` references unknown architecture `{arch}`")]
    UnknownArchitecture { benchmark: String, arch: String },

    /// Translation needs the foreign object produced by a native build
    #[error("benchmark `{benchmark}` translates from `{arch}` but does not build it natively")]
    ForeignWithoutBuild { benchmark: String, arch: String },

    #[error("benchmark `{0}` is defined more than once")]
    DuplicateBenchmark(String),

    #[error("benchmark `{benchmark}`: {reason}")]
    InvalidBenchmark { benchmark: String, reason: String },

    #[error("architecture `{0}` is defined more than once in the suite")]
    DuplicateArchitecture(String),

    #[error(transparent)]
    Mode(#[from] ModeError),

    #[error("benchmark `{benchmark}`: bad template `{template}`: {source}")]
    Template {
        benchmark: String,
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("target `{0}` generated more than once")]
    DuplicateTarget(String),

    #[error("invalid target name `{0}`")]
    InvalidTargetName(String),

    #[error("task `{task}` depends on undefined task `{dep}`")]
    DanglingDependency { task: String, dep: String },

    #[error("dependency cycle through `{0}`")]
    Cycle(String),

    #[error("cannot quote `{0}` for the shell")]
    Quote(String),

    #[error("cannot serialize task graph: {0}")]
    Serialize(String),
}
