//! Command-line arguments

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use xbench_harness::ModeSet;

/// Makefile generator and overhead meter for translated benchmarks
#[derive(Parser, Debug)]
#[command(name = "xbench", version, about, long_about = None)]
pub struct Cli {
    /// Debug-level logs; `measure` also logs every command line and trial time
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the benchmark Makefile (needs TOPDIR)
    Genmake(GenmakeArgs),
    /// Time the native and translated variants of one benchmark
    Measure(MeasureArgs),
    /// Geometric mean of slowdown ratios
    Geomean(GeomeanArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Make,
    Json,
}

fn parse_modes(list: &str) -> Result<ModeSet, xbench_harness::ModeError> {
    ModeSet::parse_list(list)
}

#[derive(Args, Debug)]
pub struct GenmakeArgs {
    /// TOML suite description; the built-in MiBench suite when omitted
    #[arg(long)]
    pub suite: Option<PathBuf>,

    #[arg(short = 'o', long = "output", default_value = "Makefile")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = GraphFormat::Make)]
    pub format: GraphFormat,

    /// Compile with `-g -O0`
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Disable `-O3`
    #[arg(long = "no-opt", action = ArgAction::SetTrue)]
    pub no_opt: bool,

    /// Comma separated translation modes (overrides XBENCH_MODES)
    #[arg(long, value_parser = parse_modes)]
    pub modes: Option<ModeSet>,
}

#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// Directory holding the built binaries
    pub dir: PathBuf,

    /// Benchmark name
    pub name: String,

    /// Arguments for every variant; consumes the rest of the command line
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// File redirected to standard input
    #[arg(long)]
    pub stdin: Option<PathBuf>,

    /// Exit code a correct run returns
    #[arg(long = "exp-rc", default_value_t = 0, allow_negative_numbers = true)]
    pub exp_rc: i32,

    /// Native architecture prefix
    #[arg(long, default_value = "x86")]
    pub native: String,

    /// Foreign architecture prefix
    #[arg(long, default_value = "rv32")]
    pub foreign: String,

    #[arg(long, value_parser = parse_modes)]
    pub modes: Option<ModeSet>,

    /// Trials per variant (overrides XBENCH_TRIALS)
    #[arg(long)]
    pub trials: Option<usize>,

    /// Print the report as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GeomeanArgs {
    /// Slowdown ratios
    #[arg(required_unless_present = "reports", conflicts_with = "reports")]
    pub ratios: Vec<f64>,

    /// JSON reports written by `measure --json`; aggregated per mode
    #[arg(long, num_args = 1..)]
    pub reports: Vec<PathBuf>,

    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbench_harness::TranslationMode;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("xbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_measure_defaults() {
        let cli = parse(&["measure", "/b", "crc32"]);
        let Command::Measure(m) = cli.command else {
            panic!("expected measure");
        };
        assert_eq!(m.dir, PathBuf::from("/b"));
        assert_eq!(m.native, "x86");
        assert_eq!(m.foreign, "rv32");
        assert_eq!(m.exp_rc, 0);
        assert!(m.args.is_empty());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_measure_args_swallow_hyphens() {
        let cli = parse(&[
            "measure", "/b", "rijndael", "-v", "--exp-rc", "1", "--modes", "abi,whole", "--args",
            "-x", "in.asc", "e",
        ]);
        assert!(cli.verbose);
        let Command::Measure(m) = cli.command else {
            panic!("expected measure");
        };
        assert_eq!(m.args, vec!["-x", "in.asc", "e"]);
        assert_eq!(m.exp_rc, 1);
        assert_eq!(
            m.modes.unwrap().as_slice(),
            &[TranslationMode::Abi, TranslationMode::Whole]
        );
    }

    #[test]
    fn test_bad_mode_rejected() {
        let err = Cli::try_parse_from(["xbench", "genmake", "--modes", "globals,fast"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_genmake_defaults() {
        let Command::Genmake(g) = parse(&["genmake"]).command else {
            panic!("expected genmake");
        };
        assert_eq!(g.output, PathBuf::from("Makefile"));
        assert_eq!(g.format, GraphFormat::Make);
        assert!(!g.debug && !g.no_opt);
    }

    #[test]
    fn test_geomean_needs_input() {
        assert!(Cli::try_parse_from(["xbench", "geomean"]).is_err());
        let Command::Geomean(g) = parse(&["geomean", "1.5", "2", "3"]).command else {
            panic!("expected geomean");
        };
        assert_eq!(g.ratios, vec![1.5, 2.0, 3.0]);
    }
}
