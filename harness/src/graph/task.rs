//! Typed task graph
//!
//! Tasks are kept in insertion order, which is also the order serializers emit
//! them in. Names are unique; `deps` refer to other tasks, `sources` to files
//! that exist outside the graph.

use crate::graph::{GraphError, GraphResult};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a task does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Compile and link a native binary
    Build,
    /// Translate a foreign object and link the native result
    Translate,
    Run,
    Test,
    Measure,
    Disassemble,
    /// Groups other tasks, no commands of its own
    Alias,
    Clean,
}

/// One node of the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    /// Benchmark the task belongs to; `None` for top-level tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub kind: TaskKind,
    /// Names of tasks that must complete first
    #[serde(default)]
    pub deps: Vec<String>,
    /// External input files
    #[serde(default)]
    pub sources: Vec<String>,
    /// Shell commands, run in order
    #[serde(default)]
    pub commands: Vec<String>,
    /// Always re-run; no file-existence semantics
    pub phony: bool,
}

impl Task {
    /// A task producing the file `name`.
    pub fn file(kind: TaskKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            kind,
            deps: Vec::new(),
            sources: Vec::new(),
            commands: Vec::new(),
            phony: false,
        }
    }

    /// A task that always runs.
    pub fn phony(kind: TaskKind, name: impl Into<String>) -> Self {
        Self {
            phony: true,
            ..Self::file(kind, name)
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_dep(mut self, dep: impl Into<String>) -> Self {
        self.deps.push(dep.into());
        self
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn with_commands(mut self, commands: Vec<String>) -> Self {
        self.commands.extend(commands);
        self
    }
}

fn valid_target_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | '#' | '=' | '%' | '$'))
}

/// Ordered set of uniquely named tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: BTreeMap<String, usize>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task. Names must be unique and, like sources, usable as make
    /// targets.
    pub fn push(&mut self, task: Task) -> GraphResult<()> {
        if !valid_target_name(&task.name) {
            return Err(GraphError::InvalidTargetName(task.name));
        }
        if let Some(bad) = task.sources.iter().find(|s| !valid_target_name(s)) {
            return Err(GraphError::InvalidTargetName(bad.clone()));
        }
        if self.index.contains_key(&task.name) {
            return Err(GraphError::DuplicateTarget(task.name));
        }
        self.index.insert(task.name.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks of `kind`, optionally restricted to one benchmark.
    pub fn count(&self, kind: TaskKind, group: Option<&str>) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.kind == kind)
            .filter(|t| group.map_or(true, |g| t.group.as_deref() == Some(g)))
            .count()
    }

    /// Check that every dependency resolves and the graph is acyclic.
    pub fn validate(&self) -> GraphResult<()> {
        self.topological_order().map(|_| ())
    }

    /// Task names ordered so that every task follows its dependencies.
    pub fn topological_order(&self) -> GraphResult<Vec<&str>> {
        let mut graph = DiGraph::<usize, ()>::with_capacity(self.tasks.len(), 0);
        let nodes: Vec<_> = (0..self.tasks.len()).map(|i| graph.add_node(i)).collect();

        for (i, task) in self.tasks.iter().enumerate() {
            for dep in &task.deps {
                let &j = self
                    .index
                    .get(dep)
                    .ok_or_else(|| GraphError::DanglingDependency {
                        task: task.name.clone(),
                        dep: dep.clone(),
                    })?;
                graph.add_edge(nodes[j], nodes[i], ());
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| GraphError::Cycle(self.tasks[graph[cycle.node_id()]].name.clone()))?;
        Ok(order
            .into_iter()
            .map(|n| self.tasks[graph[n]].name.as_str())
            .collect())
    }
}
