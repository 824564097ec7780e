//! End-to-end graph generation over the built-in and TOML suites.

use xbench_harness::graph::{render_json, render_makefile, MakefileHeader};
use xbench_harness::{
    Benchmark, Config, Generator, GraphError, ModeSet, Suite, TaskKind, TranslationMode,
    TranslationPair,
};

fn config() -> Config {
    Config::for_topdir("/top")
}

fn makefile(config: &Config, suite: &Suite) -> String {
    let graph = Generator::new(config).generate(suite).unwrap();
    render_makefile(&graph, &MakefileHeader::new(config, &suite.name)).unwrap()
}

#[test]
fn test_build_counts_follow_natives_pairs_and_modes() {
    let modes = ModeSet::new(vec![TranslationMode::Globals, TranslationMode::Whole, TranslationMode::Abi]).unwrap();
    let config = config().with_modes(modes);
    let suite = Suite::mibench();
    let graph = Generator::new(&config).generate(&suite).unwrap();

    for bench in &suite.benchmarks {
        let k = bench.natives.len();
        let p = bench.pairs.len();
        assert_eq!(graph.count(TaskKind::Build, Some(bench.name.as_str())), k, "{}", bench.name);
        assert_eq!(graph.count(TaskKind::Translate, Some(bench.name.as_str())), p * 3, "{}", bench.name);
        assert_eq!(graph.count(TaskKind::Test, Some(bench.name.as_str())), k + p * 3, "{}", bench.name);
    }
}

#[test]
fn test_generation_is_idempotent() {
    let config = config();
    let suite = Suite::mibench();
    let first = makefile(&config, &suite);
    let second = makefile(&config, &suite);
    assert_eq!(first, second);

    let a = Generator::new(&config).generate(&suite).unwrap();
    let b = Generator::new(&config).generate(&suite).unwrap();
    let header = MakefileHeader::new(&config, "mibench");
    assert_eq!(render_json(&a, &header).unwrap(), render_json(&b, &header).unwrap());
}

#[test]
fn test_makefile_text_for_mibench() {
    let text = makefile(&config(), &Suite::mibench());

    assert!(text.starts_with("# Generated by xbench"));
    assert!(text.contains("export TOPDIR := /top\n"));
    assert!(text.contains(".PHONY: all\nall: benchs\n"));
    assert!(text.contains("### rijndael ###"));
    assert!(text.contains(
        "/top/build/mibench/telecomm/CRC32/x86-crc32: /top/mibench/telecomm/CRC32/crc_32.c\n"
    ));
    assert!(text.contains("rawcaudio-measure: rawcaudio\n"));
    assert!(text.contains("--stdin /top/mibench/telecomm/adpcm/data/large.pcm"));

    let all = text.find("\nall:").unwrap();
    let first_bench = text.find("### dijkstra ###").unwrap();
    assert!(all < first_bench, "`all` must be the default goal");
}

#[test]
fn test_round_trip_test_depends_on_every_phase() {
    let config = config();
    let graph = Generator::new(&config).generate(&Suite::mibench()).unwrap();

    for out in ["x86-rijndael", "rv32-rijndael", "rv32-x86-rijndael-globals", "rv32-x86-rijndael-locals"] {
        let run = graph.get(&format!("{out}-run")).unwrap();
        assert_eq!(
            run.deps,
            vec![format!("{out}-encode-run"), format!("{out}-decode-run")]
        );
        let test = graph.get(&format!("{out}-test")).unwrap();
        assert_eq!(
            test.deps,
            vec![format!("{out}-encode-run"), format!("{out}-decode-run")]
        );
        assert!(test.commands[0].starts_with("cmp "));
    }
}

#[test]
fn test_unknown_architecture_produces_no_text() {
    let config = config();
    let suite = Suite::new(
        "custom",
        vec![Benchmark::new("hello", "hello", &["hello.c"])
            .with_pairs(vec![TranslationPair::new("rv32-linux", "arm64")])],
    );
    let result = Generator::new(&config)
        .generate(&suite)
        .and_then(|g| render_makefile(&g, &MakefileHeader::new(&config, "custom")));
    assert_eq!(
        result,
        Err(GraphError::UnknownArchitecture {
            benchmark: "hello".into(),
            arch: "arm64".into()
        })
    );
}

#[test]
fn test_toml_suite_with_custom_architecture() {
    let suite = Suite::from_toml_str(
        r#"
name = "tiny"

[[architectures]]
name = "arm"
prefix = "arm"
triple = "arm-linux-gnueabihf"
run = "qemu-arm"
march = "arm"

[[benchmarks]]
name = "hello"
dir = "hello"
sources = ["hello.c", "util.c"]
args = ["{srcdir}/in.txt"]
libs = ["-lm"]
natives = ["arm", "x86"]
pairs = [{ foreign = "arm", native = "x86" }]
"#,
    )
    .unwrap();

    let config = config();
    let graph = Generator::new(&config).generate(&suite).unwrap();
    let run = graph.get("arm-hello-run").unwrap();
    assert_eq!(
        run.commands,
        vec!["qemu-arm /top/build/tiny/hello/arm-hello /top/tiny/hello/in.txt > /top/build/tiny/hello/arm-hello.out".to_string()]
    );
    let build = graph.get("/top/build/tiny/hello/arm-hello").unwrap();
    assert_eq!(build.sources.len(), 2);
    assert!(build.commands.last().unwrap().ends_with(" -lm"));
    assert!(graph.contains("arm-x86-hello-locals-test"));
}

#[test]
fn test_graph_is_acyclic_and_fully_resolved() {
    let config = config();
    let graph = Generator::new(&config).generate(&Suite::mibench()).unwrap();
    let order = graph.topological_order().unwrap();
    assert_eq!(order.len(), graph.len());
}
