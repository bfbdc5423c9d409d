// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Step definitions and the dependency graph
//!
//! This module holds the format-independent core: step specs and their
//! dependency rules, rule resolution, deterministic ordering, and planning.

mod dag;
mod definition;
mod plan;
mod resolver;
mod rules;
mod validation;

pub use dag::StepGraph;
pub use definition::*;
pub use plan::{PipelinePlan, PlannedStep, Planner};
pub use resolver::{DependencyResolver, Resolution};
pub use rules::{DependencyRule, RawRule};
pub use validation::{PipelineValidator, ValidationResult};
