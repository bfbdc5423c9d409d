// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Shared loading for commands that plan a pipeline

use std::path::{Path, PathBuf};

use super::FormatArg;
use crate::errors::{CigraphError, CigraphResult};
use crate::pipeline::{PipelineDefinition, PipelinePlan, Planner};
use crate::render::{
    extract_or_empty, render_artifact, renderer_for, CiFormat, ImageSet, Renderer,
    CIRCLE_FILE_PATH, DRONE_FILE_PATH,
};

/// Everything needed to plan and render one definition
pub struct GenerationContext {
    pub definition: PipelineDefinition,
    pub format: CiFormat,
    pub renderer: Box<dyn Renderer>,
    /// Where the rendered config lives
    pub output_path: PathBuf,
    /// Current contents of `output_path`, if any
    pub existing: Option<String>,
    /// Bound images: pins, then recovered, then defaults
    pub images: ImageSet,
}

impl GenerationContext {
    /// Load the definition, settle the format and recover pinned images
    pub async fn load(
        definition_path: &Path,
        format: FormatArg,
        output: Option<PathBuf>,
    ) -> CigraphResult<Self> {
        let definition = PipelineDefinition::from_file(definition_path)?;
        let root = project_root(definition_path);
        let format = resolve_format(format, &definition, &root)?;

        let renderer = renderer_for(format, &definition);
        let output_path = output
            .or_else(|| definition.output.as_ref().map(|o| root.join(o)))
            .unwrap_or_else(|| root.join(renderer.default_path()));

        let existing = read_existing(&output_path).await;

        // Explicitly imaged steps never seed a role
        let skip = definition.explicit_image_steps(format);
        let mut images = existing
            .as_deref()
            .map(|artifact| extract_or_empty(renderer.as_ref(), artifact, &skip))
            .unwrap_or_default();
        images.override_with(&definition.images);
        images.fill_missing(&renderer.default_images());

        tracing::debug!(
            format = %format,
            output = %output_path.display(),
            existing = existing.is_some(),
            "Loaded generation context"
        );

        Ok(Self {
            definition,
            format,
            renderer,
            output_path,
            existing,
            images,
        })
    }

    pub fn plan(&self) -> CigraphResult<PipelinePlan> {
        Planner::plan_definition(&self.definition, self.format, &self.images)
    }

    /// Render the full config for a plan
    pub fn render(&self, plan: &PipelinePlan) -> CigraphResult<String> {
        render_artifact(self.renderer.as_ref(), &self.definition.header, &plan.steps)
    }

    /// Whether `content` matches what is already on disk
    pub fn is_current(&self, content: &str) -> bool {
        self.existing.as_deref() == Some(content)
    }
}

/// Directory holding the definition file
pub fn project_root(definition_path: &Path) -> PathBuf {
    match definition_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Settle the target format: flag, then definition, then detection
pub fn resolve_format(
    format: FormatArg,
    definition: &PipelineDefinition,
    root: &Path,
) -> CigraphResult<CiFormat> {
    match (format, definition.format) {
        (FormatArg::Format(format), _) => Ok(format),
        (FormatArg::Auto, Some(format)) => Ok(format),
        (FormatArg::Auto, None) => detect_format(root),
    }
}

/// Pick the format from the CI config already present in `root`
pub fn detect_format(root: &Path) -> CigraphResult<CiFormat> {
    if root.join(DRONE_FILE_PATH).is_file() {
        return Ok(CiFormat::Drone);
    }
    if root.join(CIRCLE_FILE_PATH).is_file() {
        return Ok(CiFormat::Circle);
    }

    Err(CigraphError::FormatDetectionFailed {
        dir: root.to_path_buf(),
    })
}

/// Read the previous config; absence and read failures both yield `None`
async fn read_existing(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Error reading existing config - continuing without it"
            );
            None
        }
    }
}
