// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Step graph ordering
//!
//! Orders steps by iterative layering rather than a DFS toposort: steps are
//! sorted by name once, then swept repeatedly in that order, emitting every
//! step whose dependencies are already emitted. The output only depends on
//! the step names and their resolved dependencies, never on input order.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::errors::{CigraphError, CigraphResult};

/// Ordered dependency graph over a fixed set of steps
#[derive(Debug, Clone)]
pub struct StepGraph {
    names: Vec<String>,
    dependencies: Vec<BTreeSet<String>>,
    order: Vec<usize>,
}

impl StepGraph {
    /// Order the steps.
    ///
    /// `names[i]` depends on every name in `dependencies[i]`. Fails with
    /// [`CigraphError::CircularDependency`] when some steps can never be
    /// emitted; no partial ordering is returned in that case.
    pub fn build(names: Vec<String>, dependencies: Vec<BTreeSet<String>>) -> CigraphResult<Self> {
        debug_assert_eq!(names.len(), dependencies.len());

        let known: HashSet<&str> = names.iter().map(String::as_str).collect();
        for (name, deps) in names.iter().zip(&dependencies) {
            if let Some(missing) = deps.iter().find(|d| !known.contains(d.as_str())) {
                return Err(CigraphError::UnknownDependency {
                    step: name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        let order = Self::layered_order(&names, &dependencies)?;
        Ok(Self {
            names,
            dependencies,
            order,
        })
    }

    fn layered_order(names: &[String], dependencies: &[BTreeSet<String>]) -> CigraphResult<Vec<usize>> {
        let mut base: Vec<usize> = (0..names.len()).collect();
        base.sort_by(|a, b| names[*a].cmp(&names[*b]));

        let mut emitted = vec![false; names.len()];
        let mut satisfied: HashSet<&str> = HashSet::with_capacity(names.len());
        let mut order = Vec::with_capacity(names.len());

        while order.len() < names.len() {
            let before = order.len();

            for &idx in &base {
                if emitted[idx] {
                    continue;
                }

                if dependencies[idx].iter().all(|d| satisfied.contains(d.as_str())) {
                    emitted[idx] = true;
                    satisfied.insert(names[idx].as_str());
                    order.push(idx);
                }
            }

            if order.len() == before {
                let remaining: Vec<usize> = base.into_iter().filter(|i| !emitted[*i]).collect();
                return Err(CigraphError::CircularDependency {
                    steps: Self::cycle_members(names, dependencies, &remaining),
                });
            }
        }

        Ok(order)
    }

    /// Names of the steps that sit on a cycle among `remaining`
    fn cycle_members(
        names: &[String],
        dependencies: &[BTreeSet<String>],
        remaining: &[usize],
    ) -> Vec<String> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

        for &idx in remaining {
            nodes.insert(names[idx].as_str(), graph.add_node(idx));
        }

        for &idx in remaining {
            let to = nodes[names[idx].as_str()];
            for dep in &dependencies[idx] {
                if let Some(from) = nodes.get(dep.as_str()) {
                    graph.add_edge(*from, to, ());
                }
            }
        }

        let mut members: Vec<String> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .flatten()
            .map(|node| names[graph[node]].clone())
            .collect();

        if members.is_empty() {
            members = remaining.iter().map(|i| names[*i].clone()).collect();
        }

        members.sort();
        members
    }

    /// Step indices in execution order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Step names in execution order
    pub fn ordered_names(&self) -> Vec<&str> {
        self.order.iter().map(|i| self.names[*i].as_str()).collect()
    }

    /// Dependencies of a step (steps that must run before it), sorted
    pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(&self.dependencies[idx])
    }

    /// Dependents of a step (steps that directly depend on it), in execution order
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.order
            .iter()
            .filter(|i| self.dependencies[**i].contains(name))
            .map(|i| self.names[*i].as_str())
            .collect()
    }

    /// Generate text representation of execution order
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for (i, idx) in self.order.iter().enumerate() {
            out.push_str(&format!("{}. {}", i + 1, self.names[*idx]));

            let deps = &self.dependencies[*idx];
            if !deps.is_empty() {
                let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for idx in &self.order {
            out.push_str(&format!("    \"{}\";\n", self.names[*idx]));
        }

        out.push('\n');

        for idx in &self.order {
            for dep in &self.dependencies[*idx] {
                out.push_str(&format!("    \"{}\" -> \"{}\";\n", dep, self.names[*idx]));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        // Positional ids; step names may contain characters mermaid rejects.
        let ids: HashMap<&str, String> = self
            .order
            .iter()
            .enumerate()
            .map(|(pos, idx)| (self.names[*idx].as_str(), format!("s{}", pos)))
            .collect();

        for idx in &self.order {
            let name = self.names[*idx].as_str();
            out.push_str(&format!("    {}[\"{}\"]\n", ids[name], name));
        }

        for idx in &self.order {
            let name = self.names[*idx].as_str();
            for dep in &self.dependencies[*idx] {
                out.push_str(&format!("    {} --> {}\n", ids[dep.as_str()], ids[name]));
            }
        }

        out
    }
}
