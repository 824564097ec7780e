//! Round-trip benchmarks
//!
//! Each variant runs its phases in order (a later phase reads what the
//! previous one wrote) and the test compares the final output with the
//! original input byte for byte. Measurement is split per phase the same way.

use crate::bench::RoundTrip;
use crate::graph::generator::BenchContext;
use crate::graph::naming;
use crate::graph::recipes::RunSpec;
use crate::graph::{GraphResult, Task, TaskGraph, TaskKind};

pub(crate) fn emit(ctx: &BenchContext<'_>, rt: &RoundTrip, graph: &mut TaskGraph) -> GraphResult<()> {
    let name = ctx.name();
    let targets = ctx.emit_builds(graph)?;
    let mut runs = Vec::new();
    let mut tests = Vec::new();

    for (variant, arch) in ctx.variants()? {
        let out = variant.output_name(name);
        let binary = ctx.binary(&variant);
        let stdin = ctx.stdin(Some(&variant))?;

        let mut phase_runs: Vec<String> = Vec::with_capacity(rt.phases.len());
        for phase in &rt.phases {
            let args = ctx.render_all(&phase.args, Some(&variant))?;
            let stdout = format!("{}/{out}{}.out", ctx.layout.dstdir, phase.suffix);
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
            let target = naming::phase_run_target(&out, &phase.suffix);
            graph.push(
                Task::phony(TaskKind::Run, &target)
                    .in_group(name)
                    .with_dep(&binary)
                    .with_deps(phase_runs.last().cloned())
                    .with_command(command),
            )?;
            phase_runs.push(target);
        }

        let run = naming::run_target(&out);
        graph.push(
            Task::phony(TaskKind::Alias, &run)
                .in_group(name)
                .with_deps(phase_runs.iter().cloned()),
        )?;

        let input = ctx.render(&rt.input, Some(&variant))?;
        let output = ctx.render(&rt.output, Some(&variant))?;
        let test = naming::test_target(&out);
        graph.push(
            Task::phony(TaskKind::Test, &test)
                .in_group(name)
                .with_deps(phase_runs)
                .with_command(ctx.recipes.compare(&output, &input)?),
        )?;
        runs.push(run);
        tests.push(test);
    }

    ctx.emit_aliases(graph, targets, runs, tests)?;

    let stdin = ctx.stdin(None)?;
    let mut phase_measures: Vec<String> = Vec::with_capacity(rt.phases.len());
    for phase in &rt.phases {
        let args = ctx.render_all(&phase.args, None)?;
        let target = naming::phase_measure_target(name, &phase.suffix);
        graph.push(
            Task::phony(TaskKind::Measure, &target)
                .in_group(name)
                .with_dep(name)
                .with_deps(phase_measures.last().cloned())
                .with_commands(ctx.measure_commands(&args, stdin.as_deref())?),
        )?;
        phase_measures.push(target);
    }
    graph.push(
        Task::phony(TaskKind::Alias, naming::measure_target(name))
            .in_group(name)
            .with_deps(phase_measures),
    )?;

    Ok(())
}
