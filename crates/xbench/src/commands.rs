//! Subcommand implementations

use crate::cli::{Cli, Command, GenmakeArgs, GeomeanArgs, GraphFormat, MeasureArgs};
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use xbench_harness::graph::{render_json, render_makefile, MakefileHeader};
use xbench_harness::measure::{aggregate_geomeans, MeasurementReport};
use xbench_harness::{
    geometric_mean, BuildOptions, Config, Generator, MeasureOptions, MeasureRequest,
    MeasureSession, ProcessRunner, ProgramRunner, Suite,
};

/// Dispatch a parsed command line. Reports go to stdout.
pub fn run(cli: Cli) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Command::Genmake(args) => {
            let config = Config::from_env().context("Failed to resolve configuration")?;
            let path = genmake(args, &config)?;
            info!(path = %path.display(), "Wrote build graph");
            Ok(())
        }
        Command::Measure(args) => {
            let config = Config::from_env().context("Failed to resolve configuration")?;
            let options = MeasureOptions::from_config(&config);
            measure(args, cli.verbose, options, &ProcessRunner, &mut stdout).map(|_| ())
        }
        Command::Geomean(args) => geomean(args, &mut stdout),
    }
}

/// Render the build graph for `args`, without touching the filesystem.
pub fn render_graph(args: &GenmakeArgs, config: &Config) -> Result<String> {
    let config = match &args.modes {
        Some(modes) => config.clone().with_modes(modes.clone()),
        None => config.clone(),
    };
    let suite = match &args.suite {
        Some(path) => Suite::from_file(path)
            .with_context(|| format!("Failed to load suite {}", path.display()))?,
        None => Suite::mibench(),
    };
    let options = BuildOptions {
        debug: args.debug,
        optimize: !args.no_opt,
    };

    let graph = Generator::new(&config)
        .with_build_options(options)
        .generate(&suite)
        .with_context(|| format!("Invalid benchmark suite `{}`", suite.name))?;
    let header = MakefileHeader::new(&config, &suite.name);
    let text = match args.format {
        GraphFormat::Make => render_makefile(&graph, &header)?,
        GraphFormat::Json => render_json(&graph, &header)?,
    };
    Ok(text)
}

/// Generate the graph and write it to `args.output`. Nothing is written on error.
pub fn genmake(args: &GenmakeArgs, config: &Config) -> Result<PathBuf> {
    let text = render_graph(args, config)?;
    fs::write(&args.output, text)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    Ok(args.output.clone())
}

/// Run a measurement session and print its report.
pub fn measure<R: ProgramRunner + ?Sized>(
    args: &MeasureArgs,
    verbose: bool,
    base: MeasureOptions,
    runner: &R,
    out: &mut dyn Write,
) -> Result<MeasurementReport> {
    let mut request = MeasureRequest::new(&args.dir, &args.name)
        .with_args(&args.args)
        .with_native(&args.native)
        .with_foreign(&args.foreign);
    if let Some(modes) = &args.modes {
        request = request.with_modes(modes.clone());
    }

    let mut options = base.with_verbose(verbose).with_exp_rc(args.exp_rc);
    if let Some(stdin) = &args.stdin {
        options = options.with_stdin(stdin);
    }
    if let Some(trials) = args.trials {
        options = options.with_trials(trials);
    }

    let report = MeasureSession::new(request, options, runner)
        .run()
        .with_context(|| format!("Measurement of `{}` failed", args.name))?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(out, "{report}")?;
    }
    Ok(report)
}

/// Print the geometric mean of the given ratios, or per-mode means of reports.
pub fn geomean(args: &GeomeanArgs, out: &mut dyn Write) -> Result<()> {
    if args.reports.is_empty() {
        let value = geometric_mean(&args.ratios)?;
        if args.json {
            writeln!(out, "{}", json!({ "geomean": value, "count": args.ratios.len() }))?;
        } else {
            writeln!(out, "{value:.4}")?;
        }
        return Ok(());
    }

    let mut reports = Vec::with_capacity(args.reports.len());
    for path in &args.reports {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report: MeasurementReport = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse report {}", path.display()))?;
        reports.push(report);
    }

    let means = aggregate_geomeans(&reports)?;
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&means)?)?;
    } else {
        for mean in &means {
            writeln!(out, "{mean}")?;
        }
    }
    Ok(())
}
