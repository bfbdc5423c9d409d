// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Generation planning
//!
//! Ties the core together for one format: select the steps, resolve their
//! rules, order them and bind images. The resulting [`PipelinePlan`] is
//! everything a renderer needs.

use std::collections::{BTreeMap, HashSet};

use crate::errors::{CigraphError, CigraphResult};
use crate::pipeline::{CacheSpec, DependencyResolver, PipelineDefinition, StepGraph, StepSpec};
use crate::render::{CiFormat, ImageSet};

/// A step ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: String,
    pub image: String,
    pub commands: Vec<String>,
    pub environment: BTreeMap<String, String>,
    /// Resolved dependencies, sorted
    pub dependencies: Vec<String>,
    /// Position in execution order
    pub position: usize,
    pub checkout: bool,
    pub needs_docker: bool,
    pub no_workspace: bool,
    pub persist: Vec<String>,
    pub cache: Option<CacheSpec>,
}

/// Ordered, resolved steps for one format
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub format: CiFormat,
    pub steps: Vec<PlannedStep>,
    /// `(step, rule)` pairs whose rule matched no other step
    pub unmatched_rules: Vec<(String, String)>,
    graph: StepGraph,
}

impl PipelinePlan {
    /// The ordered dependency graph behind this plan
    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn get_step(&self, name: &str) -> Option<&PlannedStep> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Builds a [`PipelinePlan`] from step specs
pub struct Planner;

impl Planner {
    /// Plan the steps of a definition that apply to `format`
    pub fn plan_definition(
        definition: &PipelineDefinition,
        format: CiFormat,
        images: &ImageSet,
    ) -> CigraphResult<PipelinePlan> {
        Self::plan(definition.steps_for(format), format, images)
    }

    /// Resolve, order and bind images for `steps`.
    ///
    /// Fails on duplicate names, cycles, or a step whose image cannot be
    /// determined. Rules that match nothing are recorded, not fatal.
    pub fn plan(steps: Vec<StepSpec>, format: CiFormat, images: &ImageSet) -> CigraphResult<PipelinePlan> {
        Self::check_unique(&steps)?;

        let resolutions = DependencyResolver::resolve(&steps);

        let mut unmatched_rules = Vec::new();
        for (step, resolution) in steps.iter().zip(&resolutions) {
            tracing::debug!(
                step = %step.name,
                dependencies = ?resolution.dependencies,
                "Resolved dependencies"
            );
            for rule in &resolution.unmatched_rules {
                unmatched_rules.push((step.name.clone(), rule.clone()));
            }
        }

        let names = steps.iter().map(|s| s.name.clone()).collect();
        let dependencies = resolutions.into_iter().map(|r| r.dependencies).collect();
        let graph = StepGraph::build(names, dependencies)?;

        let mut planned = Vec::with_capacity(steps.len());
        for (position, idx) in graph.order().iter().enumerate() {
            let step = &steps[*idx];
            let dependencies = graph
                .dependencies(&step.name)
                .map(|d| d.iter().cloned().collect())
                .unwrap_or_default();

            planned.push(PlannedStep {
                name: step.name.clone(),
                image: Self::bind_image(step, images)?,
                commands: step.commands.clone(),
                environment: step.environment.clone(),
                dependencies,
                position,
                checkout: step.checkout,
                needs_docker: step.needs_docker,
                no_workspace: step.no_workspace,
                persist: step.persist.clone(),
                cache: step.cache.clone(),
            });
        }

        tracing::debug!(
            format = %format,
            order = ?graph.ordered_names(),
            "Ordered steps"
        );

        Ok(PipelinePlan {
            format,
            steps: planned,
            unmatched_rules,
            graph,
        })
    }

    fn check_unique(steps: &[StepSpec]) -> CigraphResult<()> {
        let mut seen = HashSet::new();
        for step in steps {
            if !seen.insert(step.name.as_str()) {
                return Err(CigraphError::DuplicateStep {
                    step: step.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Explicit image first, then the step's role from `images`
    fn bind_image(step: &StepSpec, images: &ImageSet) -> CigraphResult<String> {
        if let Some(image) = step.image.as_ref().filter(|_| step.has_explicit_image()) {
            return Ok(image.clone());
        }

        step.image_role
            .and_then(|role| images.get(role))
            .map(String::from)
            .ok_or_else(|| CigraphError::MissingImage {
                step: step.name.clone(),
            })
    }
}
