// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Dependency resolution
//!
//! Evaluates each step's rules against the names of every step in the
//! pipeline. The output is a computed attribute parallel to the step list;
//! the steps themselves are never modified.

use std::collections::BTreeSet;

use crate::pipeline::StepSpec;

/// Resolved dependencies of one step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Names of the steps this one depends on, sorted
    pub dependencies: BTreeSet<String>,

    /// Rules (as authored) that matched no other step
    pub unmatched_rules: Vec<String>,
}

/// Resolves dependency rules into concrete step names
pub struct DependencyResolver;

impl DependencyResolver {
    /// Resolve every step against the full set of names.
    ///
    /// The result is indexed like `steps`.
    pub fn resolve(steps: &[StepSpec]) -> Vec<Resolution> {
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        steps
            .iter()
            .map(|step| Self::resolve_step(step, &names))
            .collect()
    }

    /// Resolve a single step's rules against `names`.
    ///
    /// A step never depends on itself, even when one of its rules matches its
    /// own name. A rule matching nothing contributes no edges.
    pub fn resolve_step(step: &StepSpec, names: &[&str]) -> Resolution {
        let mut resolution = Resolution::default();

        for rule in &step.depends_on {
            let before = resolution.dependencies.len();
            let mut matched_any = false;

            for name in names.iter().filter(|n| **n != step.name) {
                if rule.matches(name) {
                    matched_any = true;
                    resolution.dependencies.insert((*name).to_string());
                }
            }

            if !matched_any {
                resolution.unmatched_rules.push(rule.to_string());
            }

            tracing::trace!(
                step = %step.name,
                rule = %rule,
                added = resolution.dependencies.len() - before,
                "Evaluated dependency rule"
            );
        }

        resolution
    }
}
