//! Suite expansion
//!
//! [`Generator::generate`] checks the whole suite before emitting anything,
//! then expands every benchmark into build, translate, run, test, measure and
//! alias tasks. Output depends only on the configuration and the suite, so two
//! runs over the same inputs produce identical graphs.

use crate::arch::{ArchSet, Architecture, BuildOptions};
use crate::bench::{render, Benchmark, Suite, TemplateVars};
use crate::config::Config;
use crate::graph::naming::{self, Variant};
use crate::graph::recipes::{Layout, MeasureSpec, Recipes, RunSpec};
use crate::graph::{round_trip, GraphError, GraphResult, Task, TaskGraph, TaskKind};
use crate::mode::ModeError;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Expands suites into task graphs for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
    config: &'a Config,
    options: BuildOptions,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            options: BuildOptions::default(),
        }
    }

    pub fn with_build_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Built-in architectures plus the suite's own, which override by name.
    pub fn architectures(&self, suite: &Suite) -> GraphResult<ArchSet> {
        let mut archs = ArchSet::standard(&self.config.dirs);
        let mut seen = BTreeSet::new();
        for arch in &suite.architectures {
            if !seen.insert(arch.name.as_str()) {
                return Err(GraphError::DuplicateArchitecture(arch.name.clone()));
            }
            if archs.insert(arch.clone()).is_some() {
                debug!(arch = %arch.name, "Suite overrides built-in architecture");
            }
        }
        Ok(archs)
    }

    /// Expand `suite` into a validated task graph.
    pub fn generate(&self, suite: &Suite) -> GraphResult<TaskGraph> {
        let archs = self.architectures(suite)?;
        self.check_suite(suite, &archs)?;

        let recipes = Recipes::new(self.config, self.options);
        let root = self.config.dirs.top.join(&suite.name);
        let build = self.config.dirs.build.join(&suite.name);

        let mut graph = TaskGraph::new();
        graph.push(Task::phony(TaskKind::Alias, "all").with_dep("benchs"))?;
        graph.push(
            Task::phony(TaskKind::Clean, "clean")
                .with_command(recipes.clean(&build.display().to_string())?),
        )?;

        for bench in &suite.benchmarks {
            let layout = Layout {
                root: root.display().to_string(),
                srcdir: root.join(&bench.dir).display().to_string(),
                dstdir: build.join(&bench.dir).display().to_string(),
            };
            let ctx = BenchContext {
                bench,
                archs: &archs,
                recipes,
                layout,
            };

            let before = graph.len();
            match &bench.round_trip {
                Some(rt) => round_trip::emit(&ctx, rt, &mut graph)?,
                None => emit_standard(&ctx, &mut graph)?,
            }
            debug!(
                benchmark = %bench.name,
                tasks = graph.len() - before,
                round_trip = bench.is_round_trip(),
                "Expanded benchmark"
            );
        }

        let names: Vec<&str> = suite.benchmarks.iter().map(|b| b.name.as_str()).collect();
        graph.push(Task::phony(TaskKind::Alias, "benchs").with_deps(names.iter().copied()))?;
        graph.push(
            Task::phony(TaskKind::Alias, "benchs-test")
                .with_dep("benchs")
                .with_deps(names.iter().map(|n| naming::test_target(n))),
        )?;
        graph.push(
            Task::phony(TaskKind::Alias, "benchs-measure")
                .with_deps(names.iter().map(|n| naming::measure_target(n))),
        )?;

        graph.validate()?;
        info!(
            suite = %suite.name,
            benchmarks = suite.benchmarks.len(),
            tasks = graph.len(),
            "Generated task graph"
        );
        Ok(graph)
    }

    fn check_suite(&self, suite: &Suite, archs: &ArchSet) -> GraphResult<()> {
        if self.config.modes.is_empty() {
            return Err(ModeError::Empty.into());
        }
        let mut names = BTreeSet::new();
        for bench in &suite.benchmarks {
            if !names.insert(bench.name.as_str()) {
                return Err(GraphError::DuplicateBenchmark(bench.name.clone()));
            }
            check_benchmark(bench, archs)?;
        }
        Ok(())
    }
}

fn invalid(bench: &Benchmark, reason: impl Into<String>) -> GraphError {
    GraphError::InvalidBenchmark {
        benchmark: bench.name.clone(),
        reason: reason.into(),
    }
}

fn check_arch(bench: &Benchmark, archs: &ArchSet, name: &str) -> GraphResult<()> {
    if archs.contains(name) {
        Ok(())
    } else {
        Err(GraphError::UnknownArchitecture {
            benchmark: bench.name.clone(),
            arch: name.to_string(),
        })
    }
}

fn check_benchmark(bench: &Benchmark, archs: &ArchSet) -> GraphResult<()> {
    if bench.name.is_empty() || bench.name.contains(|c: char| c.is_whitespace() || c == '/') {
        return Err(invalid(bench, "name must be a single non-empty word"));
    }
    if bench.sources.is_empty() {
        return Err(invalid(bench, "no sources"));
    }
    if bench.natives.is_empty() {
        return Err(invalid(bench, "no native architectures"));
    }

    let mut natives = BTreeSet::new();
    for name in &bench.natives {
        check_arch(bench, archs, name)?;
        if !natives.insert(name.as_str()) {
            return Err(invalid(bench, format!("architecture `{name}` listed twice")));
        }
    }

    let mut pairs = BTreeSet::new();
    for pair in &bench.pairs {
        check_arch(bench, archs, &pair.foreign)?;
        check_arch(bench, archs, &pair.native)?;
        if !natives.contains(pair.foreign.as_str()) {
            return Err(GraphError::ForeignWithoutBuild {
                benchmark: bench.name.clone(),
                arch: pair.foreign.clone(),
            });
        }
        if !pairs.insert((pair.foreign.as_str(), pair.native.as_str())) {
            return Err(invalid(
                bench,
                format!("translation {} -> {} listed twice", pair.foreign, pair.native),
            ));
        }
    }

    if let Some(rt) = &bench.round_trip {
        if !bench.args.is_empty() {
            return Err(invalid(bench, "round-trip benchmarks take arguments per phase"));
        }
        if rt.phases.len() < 2 {
            return Err(invalid(bench, "a round trip needs at least two phases"));
        }
        let mut suffixes = BTreeSet::new();
        for phase in &rt.phases {
            if phase.suffix.is_empty() || !suffixes.insert(phase.suffix.as_str()) {
                return Err(invalid(bench, "phase suffixes must be non-empty and unique"));
            }
        }
    }

    // Unknown placeholders fail here rather than halfway through emission.
    let defaults = TemplateVars::default();
    for template in templates(bench) {
        render(template, &defaults).map_err(|source| GraphError::Template {
            benchmark: bench.name.clone(),
            template: template.to_string(),
            source,
        })?;
    }
    Ok(())
}

fn templates(bench: &Benchmark) -> Vec<&str> {
    let mut all: Vec<&str> = bench.args.iter().map(String::as_str).collect();
    all.extend(bench.stdin.as_deref());
    if let Some(rt) = &bench.round_trip {
        all.push(&rt.input);
        all.push(&rt.output);
        for phase in &rt.phases {
            all.extend(phase.args.iter().map(String::as_str));
        }
    }
    all
}

/// Everything needed to expand one benchmark.
pub(crate) struct BenchContext<'g> {
    pub bench: &'g Benchmark,
    pub archs: &'g ArchSet,
    pub recipes: Recipes<'g>,
    pub layout: Layout,
}

impl<'g> BenchContext<'g> {
    pub fn name(&self) -> &'g str {
        &self.bench.name
    }

    fn arch(&self, name: &str) -> GraphResult<&'g Architecture> {
        self.archs
            .get(name)
            .ok_or_else(|| GraphError::UnknownArchitecture {
                benchmark: self.bench.name.clone(),
                arch: name.to_string(),
            })
    }

    /// Path of the binary built for `variant`.
    pub fn binary(&self, variant: &Variant) -> String {
        format!("{}/{}", self.layout.dstdir, variant.output_name(self.name()))
    }

    /// Render a template for `variant`; `None` leaves `{prefix}` and `{mode}` empty.
    pub fn render(&self, template: &str, variant: Option<&Variant>) -> GraphResult<String> {
        let prefix = variant.map(Variant::prefix_token).unwrap_or_default();
        let mode = variant.map(Variant::mode_token).unwrap_or_default();
        let vars = TemplateVars {
            root: &self.layout.root,
            srcdir: &self.layout.srcdir,
            dstdir: &self.layout.dstdir,
            prefix: &prefix,
            mode: &mode,
        };
        render(template, &vars).map_err(|source| GraphError::Template {
            benchmark: self.bench.name.clone(),
            template: template.to_string(),
            source,
        })
    }

    pub fn render_all(
        &self,
        templates: &[String],
        variant: Option<&Variant>,
    ) -> GraphResult<Vec<String>> {
        templates.iter().map(|t| self.render(t, variant)).collect()
    }

    pub fn stdin(&self, variant: Option<&Variant>) -> GraphResult<Option<String>> {
        self.bench
            .stdin
            .as_deref()
            .map(|s| self.render(s, variant))
            .transpose()
    }

    /// Every executable variant with the architecture it runs on: natives
    /// first, then each translation pair in every mode.
    pub fn variants(&self) -> GraphResult<Vec<(Variant, &'g Architecture)>> {
        let mut variants = Vec::new();
        for name in &self.bench.natives {
            let arch = self.arch(name)?;
            variants.push((Variant::native(&arch.prefix), arch));
        }
        for pair in &self.bench.pairs {
            let foreign = self.arch(&pair.foreign)?;
            let native = self.arch(&pair.native)?;
            for mode in self.recipes.modes().iter() {
                variants.push((Variant::translated(&foreign.prefix, &native.prefix, mode), native));
            }
        }
        Ok(variants)
    }

    /// Emit native builds, translations and disassembly listings.
    /// Returns the targets the `<bench>` alias should depend on.
    pub fn emit_builds(&self, graph: &mut TaskGraph) -> GraphResult<Vec<String>> {
        let bench = self.bench;
        let name = self.name();
        let sources: Vec<String> = bench
            .sources
            .iter()
            .map(|s| format!("{}/{}", self.layout.srcdir, s))
            .collect();
        let mut targets = Vec::new();

        for native in &bench.natives {
            let arch = self.arch(native)?;
            let binary = self.binary(&Variant::native(&arch.prefix));
            let commands = self.recipes.build_native(
                arch,
                name,
                &bench.sources,
                &bench.cflags,
                &bench.libs,
                &self.layout,
            )?;
            graph.push(
                Task::file(TaskKind::Build, &binary)
                    .in_group(name)
                    .with_sources(sources.iter().cloned())
                    .with_commands(commands),
            )?;
            targets.push(binary);
        }

        for pair in &bench.pairs {
            let foreign = self.arch(&pair.foreign)?;
            let native = self.arch(&pair.native)?;
            let foreign_binary = self.binary(&Variant::native(&foreign.prefix));
            for mode in self.recipes.modes().iter() {
                let variant = Variant::translated(&foreign.prefix, &native.prefix, mode);
                let out = variant.output_name(name);
                let binary = self.binary(&variant);
                let commands = self.recipes.translate(
                    foreign,
                    native,
                    mode,
                    name,
                    &out,
                    &bench.libs,
                    &self.layout,
                )?;
                graph.push(
                    Task::file(TaskKind::Translate, &binary)
                        .in_group(name)
                        .with_dep(&foreign_binary)
                        .with_commands(commands),
                )?;
                targets.push(binary);
            }
        }

        if let Some(objdump) = self.recipes.disassembler() {
            let mut seen = BTreeSet::new();
            for pair in &bench.pairs {
                let foreign = self.arch(&pair.foreign)?;
                if !seen.insert(foreign.prefix.as_str()) {
                    continue;
                }
                let binary = self.binary(&Variant::native(&foreign.prefix));
                let listing = format!("{binary}.dis");
                graph.push(
                    Task::file(TaskKind::Disassemble, &listing)
                        .in_group(name)
                        .with_dep(&binary)
                        .with_command(self.recipes.disassemble(objdump, &binary, &listing)?),
                )?;
                targets.push(listing);
            }
        }

        Ok(targets)
    }

    /// `<bench>`, `<bench>-run` and `<bench>-test`.
    pub fn emit_aliases(
        &self,
        graph: &mut TaskGraph,
        targets: Vec<String>,
        runs: Vec<String>,
        tests: Vec<String>,
    ) -> GraphResult<()> {
        let name = self.name();
        graph.push(Task::phony(TaskKind::Alias, name).in_group(name).with_deps(targets))?;
        graph.push(
            Task::phony(TaskKind::Alias, naming::run_target(name))
                .in_group(name)
                .with_deps(runs),
        )?;
        graph.push(
            Task::phony(TaskKind::Alias, naming::test_target(name))
                .in_group(name)
                .with_deps(tests),
        )?;
        Ok(())
    }

    /// One `xbench measure` line per translation pair.
    pub fn measure_commands(
        &self,
        args: &[String],
        stdin: Option<&str>,
    ) -> GraphResult<Vec<String>> {
        self.bench
            .pairs
            .iter()
            .map(|pair| {
                let foreign = self.arch(&pair.foreign)?;
                let native = self.arch(&pair.native)?;
                self.recipes.measure(MeasureSpec {
                    dstdir: &self.layout.dstdir,
                    bench: self.name(),
                    native_prefix: &native.prefix,
                    foreign_prefix: &foreign.prefix,
                    args,
                    stdin,
                    exp_rc: self.bench.exp_rc,
                })
            })
            .collect()
    }
}

fn emit_standard(ctx: &BenchContext<'_>, graph: &mut TaskGraph) -> GraphResult<()> {
    let name = ctx.name();
    let targets = ctx.emit_builds(graph)?;
    let mut runs = Vec::new();
    let mut tests = Vec::new();

    for (variant, arch) in ctx.variants()? {
        let out = variant.output_name(name);
        let binary = ctx.binary(&variant);
        let args = ctx.render_all(&ctx.bench.args, Some(&variant))?;
        let stdin = ctx.stdin(Some(&variant))?;
        let stdout = format!("{}/{out}.out", ctx.layout.dstdir);
        let command = ctx.recipes.run(
            arch,
            RunSpec {
                binary: &binary,
                args: &args,
                stdin: stdin.as_deref(),
                stdout: &stdout,
                exp_rc: ctx.bench.exp_rc,
            },
        )?;

        let run = naming::run_target(&out);
        graph.push(
            Task::phony(TaskKind::Run, &run)
                .in_group(name)
                .with_dep(&binary)
                .with_command(command),
        )?;
        let test = naming::test_target(&out);
        graph.push(Task::phony(TaskKind::Test, &test).in_group(name).with_dep(&run))?;
        runs.push(run);
        tests.push(test);
    }

    ctx.emit_aliases(graph, targets, runs, tests)?;

    let args = ctx.render_all(&ctx.bench.args, None)?;
    let stdin = ctx.stdin(None)?;
    graph.push(
        Task::phony(TaskKind::Measure, naming::measure_target(name))
            .in_group(name)
            .with_dep(name)
            .with_commands(ctx.measure_commands(&args, stdin.as_deref())?),
    )?;
    Ok(())
}
