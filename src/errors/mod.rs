// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Error types
//!
//! Structural problems (cycles, unsupported formats, duplicate steps) are
//! fatal and carry enough context to be actionable. Problems with a prior
//! artifact never surface here as fatal: extraction degrades to defaults.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for cigraph operations
pub type CigraphResult<T> = Result<T, CigraphError>;

/// Main error type for cigraph
#[derive(Error, Debug, Diagnostic)]
pub enum CigraphError {
    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Circular dependency detected between steps: {}", steps.join(", "))]
    #[diagnostic(
        code(cigraph::circular_dependency),
        help("Review the depends_on rules of these steps to remove the cycle")
    )]
    CircularDependency { steps: Vec<String> },

    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    #[diagnostic(code(cigraph::unknown_dependency))]
    UnknownDependency { step: String, dependency: String },

    #[error("Step name '{step}' is defined more than once")]
    #[diagnostic(
        code(cigraph::duplicate_step),
        help("Step names must be unique among the steps selected for a format")
    )]
    DuplicateStep { step: String },

    #[error("Invalid dependency rule '{rule}': {reason}")]
    #[diagnostic(code(cigraph::invalid_rule))]
    InvalidRule { rule: String, reason: String },

    #[error("Step '{step}' has no image")]
    #[diagnostic(
        code(cigraph::missing_image),
        help("Set either 'image' or 'image_role' on the step")
    )]
    MissingImage { step: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Format Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Unsupported CI format: '{requested}'")]
    #[diagnostic(
        code(cigraph::unsupported_format),
        help("Supported formats: drone, circle (or 'auto' to detect)")
    )]
    UnsupportedFormat { requested: String },

    #[error("Unable to determine CI format in {}", dir.display())]
    #[diagnostic(
        code(cigraph::format_detection_failed),
        help("Pass --format drone|circle, or set 'format' in the definition file")
    )]
    FormatDetectionFailed { dir: PathBuf },

    #[error("Unknown image role: '{role}'")]
    #[diagnostic(
        code(cigraph::unknown_image_role),
        help("Known roles: buf, fetch-task, git, go, img, js, sqlc, util")
    )]
    UnknownImageRole { role: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Definition file not found: {}", path.display())]
    #[diagnostic(
        code(cigraph::definition_not_found),
        help("Create a .cigraph.yaml listing the pipeline steps, or pass --definition")
    )]
    DefinitionNotFound { path: PathBuf },

    #[error("Failed to read file '{}': {error}", path.display())]
    #[diagnostic(code(cigraph::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{}': {error}", path.display())]
    #[diagnostic(code(cigraph::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("YAML error: {message}")]
    #[diagnostic(code(cigraph::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(cigraph::json_error))]
    Json { message: String },
}

impl From<serde_yaml::Error> for CigraphError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for CigraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}
