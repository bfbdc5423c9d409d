// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! # cigraph - CI Pipeline Step Graph Builder
//!
//! `cigraph` turns an unordered set of CI steps, each naming the steps it
//! depends on through pattern rules, into an ordered pipeline description.
//!
//! ## Features
//!
//! - **Rule-based dependencies** - regex, glob, prefix or exact name rules
//! - **Deterministic ordering** - identical input gives byte-identical output
//! - **Multiple schemas** - Drone and CircleCI renderers behind one trait
//! - **Pinned images** - image versions survive regeneration
//!
//! ## Quick Start
//!
//! ```bash
//! # Regenerate the CI config from .cigraph.yaml
//! cigraph generate
//!
//! # Fail in CI when the config is stale
//! cigraph check
//!
//! # Inspect the planned order
//! cigraph order
//! ```

pub mod cli;
pub mod errors;
pub mod pipeline;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use errors::{CigraphError, CigraphResult};
pub use pipeline::{DependencyRule, PipelineDefinition, PipelinePlan, Planner, StepSpec};
pub use render::{CiFormat, ImageRole, ImageSet, Renderer};
