//! `genmake` against a scratch TOPDIR.

use std::fs;
use xbench::cli::{GenmakeArgs, GraphFormat};
use xbench::commands::{genmake, render_graph};
use xbench_harness::{Config, ModeSet};

fn args(output: std::path::PathBuf) -> GenmakeArgs {
    GenmakeArgs {
        suite: None,
        output,
        format: GraphFormat::Make,
        debug: false,
        no_opt: false,
        modes: None,
    }
}

#[test]
fn test_genmake_writes_makefile() {
    let top = tempfile::tempdir().unwrap();
    let config = Config::for_topdir(top.path());
    let out = top.path().join("Makefile");

    let written = genmake(&args(out.clone()), &config).unwrap();
    assert_eq!(written, out);

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains(&format!("export TOPDIR := {}", top.path().display())));
    assert!(text.contains(".PHONY: benchs-measure"));
    assert!(text.contains("-O3"));
}

#[test]
fn test_genmake_flags_and_modes() {
    let top = tempfile::tempdir().unwrap();
    let config = Config::for_topdir(top.path());
    let mut a = args(top.path().join("Makefile"));
    a.debug = true;
    a.no_opt = true;
    a.modes = Some(ModeSet::parse_list("whole").unwrap());

    let text = render_graph(&a, &config).unwrap();
    assert!(text.contains("-g -O0"));
    assert!(text.contains("-regs=whole"));
    assert!(!text.contains("-regs=globals"));
    assert!(text.contains("--modes whole"));
}

#[test]
fn test_genmake_json_format() {
    let top = tempfile::tempdir().unwrap();
    let config = Config::for_topdir(top.path());
    let mut a = args(top.path().join("graph.json"));
    a.format = GraphFormat::Json;

    let text = render_graph(&a, &config).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["suite"], "mibench");
    assert_eq!(value["tasks"][0]["name"], "all");
}

#[test]
fn test_invalid_suite_writes_nothing() {
    let top = tempfile::tempdir().unwrap();
    let config = Config::for_topdir(top.path());
    let suite = top.path().join("suite.toml");
    fs::write(
        &suite,
        r#"
name = "broken"

[[benchmarks]]
name = "hello"
dir = "hello"
sources = ["hello.c"]
natives = ["x86"]
pairs = [{ foreign = "sparc", native = "x86" }]
"#,
    )
    .unwrap();

    let out = top.path().join("Makefile");
    let mut a = args(out.clone());
    a.suite = Some(suite);

    let err = genmake(&a, &config).unwrap_err();
    assert!(format!("{err:#}").contains("sparc"));
    assert!(!out.exists());
}

#[test]
fn test_missing_suite_file_is_reported() {
    let top = tempfile::tempdir().unwrap();
    let config = Config::for_topdir(top.path());
    let mut a = args(top.path().join("Makefile"));
    a.suite = Some(top.path().join("nope.toml"));
    let err = render_graph(&a, &config).unwrap_err();
    assert!(format!("{err:#}").contains("nope.toml"));
}
