//! xbench command-line front end
//!
//! Thin layer over [`xbench_harness`]: argument parsing, logging setup and
//! the `genmake`, `measure` and `geomean` subcommands.

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Command};
