// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Definition validation
//!
//! Checks a step definition for one format without rendering anything.

use std::collections::{BTreeSet, HashSet};

use crate::errors::CigraphError;
use crate::pipeline::{DependencyResolver, PipelineDefinition, StepGraph, StepSpec};
use crate::render::CiFormat;

/// Definition validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate the steps of `definition` that apply to `format`
    pub fn validate(definition: &PipelineDefinition, format: CiFormat) -> ValidationResult {
        let mut result = ValidationResult::new();
        let steps = definition.steps_for(format);

        if steps.is_empty() {
            result.add_error(&format!("Definition has no steps for {}", format));
            return result;
        }

        let mut seen_names = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for step in &steps {
            if !seen_names.insert(step.name.as_str()) {
                duplicates.insert(step.name.as_str());
            }
        }
        for name in &duplicates {
            result.add_error(&format!("Duplicate step name: '{}'", name));
        }

        for step in &steps {
            Self::validate_step(step, format, &mut result);
        }

        let resolutions = DependencyResolver::resolve(&steps);
        for (step, resolution) in steps.iter().zip(&resolutions) {
            for rule in &resolution.unmatched_rules {
                result.add_warning(&format!(
                    "Step '{}': rule {} matches no other step",
                    step.name, rule
                ));
            }
        }

        // Ordering is meaningless with ambiguous names
        if duplicates.is_empty() {
            let names = steps.iter().map(|s| s.name.clone()).collect();
            let dependencies = resolutions.into_iter().map(|r| r.dependencies).collect();

            match StepGraph::build(names, dependencies) {
                Ok(_) => {}
                Err(CigraphError::CircularDependency { steps }) => {
                    result.add_error(&format!("Circular dependency between: {}", steps.join(", ")));
                }
                Err(e) => {
                    result.add_error(&format!("Graph error: {}", e));
                }
            }
        }

        result
    }

    fn validate_step(step: &StepSpec, format: CiFormat, result: &mut ValidationResult) {
        if step.name.trim().is_empty() {
            result.add_error("Step with an empty name");
        }

        let has_image = step.has_explicit_image();
        if !has_image && step.image_role.is_none() {
            result.add_error(&format!(
                "Step '{}': neither image nor image_role is set",
                step.name
            ));
        }

        if has_image && step.image_role.is_some() {
            result.add_warning(&format!(
                "Step '{}': explicit image overrides image_role",
                step.name
            ));
        }

        if format == CiFormat::Drone {
            let ignored: Vec<&str> = [
                ("checkout", step.checkout),
                ("needs_docker", step.needs_docker),
                ("no_workspace", step.no_workspace),
                ("persist", !step.persist.is_empty()),
                ("cache", step.cache.is_some()),
            ]
            .into_iter()
            .filter_map(|(field, set)| set.then_some(field))
            .collect();

            if !ignored.is_empty() {
                result.add_warning(&format!(
                    "Step '{}': ignored for drone: {}",
                    step.name,
                    ignored.join(", ")
                ));
            }
        }

        if let Some(cache) = &step.cache {
            if cache.save_key.is_some() && cache.save_paths.is_empty() {
                result.add_warning(&format!(
                    "Step '{}': cache save_key without save_paths is never saved",
                    step.name
                ));
            }
        }
    }
}

/// Result of definition validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
