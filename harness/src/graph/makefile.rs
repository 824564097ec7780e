//! Task graph serializers

use crate::config::Config;
use crate::graph::{GraphError, GraphResult, TaskGraph};
use crate::graph::task::Task;
use serde::Serialize;

/// Values written at the top of every generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MakefileHeader {
    pub suite: String,
    pub topdir: String,
}

impl MakefileHeader {
    pub fn new(config: &Config, suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            topdir: config.dirs.top.display().to_string(),
        }
    }
}

fn escape(command: &str) -> String {
    command.replace('$', "$$")
}

/// Serialize `graph` as a Makefile.
///
/// Tasks appear in graph order, so the first task is make's default goal.
/// Fails without producing text if the graph does not validate.
pub fn render_makefile(graph: &TaskGraph, header: &MakefileHeader) -> GraphResult<String> {
    graph.validate()?;

    let mut lines = vec![
        format!("# Generated by xbench for suite `{}`; do not edit.", header.suite),
        String::new(),
        format!("export TOPDIR := {}", escape(&header.topdir)),
        String::new(),
    ];

    let mut group: Option<&str> = None;
    for task in graph.tasks() {
        if task.group.as_deref() != group {
            group = task.group.as_deref();
            if let Some(g) = group {
                lines.push(format!("### {g} ###"));
                lines.push(String::new());
            }
        }
        if task.phony {
            lines.push(format!(".PHONY: {}", task.name));
        }

        let prereqs: Vec<&str> = task
            .deps
            .iter()
            .chain(&task.sources)
            .map(String::as_str)
            .collect();
        if prereqs.is_empty() {
            lines.push(format!("{}:", task.name));
        } else {
            lines.push(format!("{}: {}", task.name, prereqs.join(" ")));
        }
        lines.extend(task.commands.iter().map(|c| format!("\t{}", escape(c))));
        lines.push(String::new());
    }

    Ok(lines.join("\n"))
}

#[derive(Serialize)]
struct GraphDocument<'a> {
    #[serde(flatten)]
    header: &'a MakefileHeader,
    tasks: &'a [Task],
}

/// Serialize `graph` as pretty-printed JSON.
pub fn render_json(graph: &TaskGraph, header: &MakefileHeader) -> GraphResult<String> {
    graph.validate()?;
    let doc = GraphDocument {
        header,
        tasks: graph.tasks(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| GraphError::Serialize(e.to_string()))
}
