// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Pipeline description renderers
//!
//! Every supported CI schema implements [`Renderer`]: render an ordered,
//! resolved step list into the schema's document, and extract pinned images
//! back out of a previously rendered document. Adding a schema means adding
//! one implementation here; resolution and ordering are untouched.

mod circle;
mod drone;
pub mod images;

pub use circle::{CircleRenderer, CircleSettings, CIRCLE_FILE_PATH};
pub use drone::{DroneRenderer, DroneSettings, DRONE_FILE_PATH};
pub use images::{ImageRole, ImageSet, Marker};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::{CigraphError, CigraphResult};
use crate::pipeline::{PipelineDefinition, PlannedStep};

/// Supported CI pipeline schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CiFormat {
    /// Linear pipeline with per-step `depends_on`
    Drone,
    /// Jobs plus a workflow declaring `requires`
    Circle,
}

impl CiFormat {
    pub const ALL: [CiFormat; 2] = [Self::Drone, Self::Circle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drone => "drone",
            Self::Circle => "circle",
        }
    }
}

impl fmt::Display for CiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CiFormat {
    type Err = CigraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drone" => Ok(Self::Drone),
            "circle" | "circleci" => Ok(Self::Circle),
            _ => Err(CigraphError::UnsupportedFormat {
                requested: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for CiFormat {
    type Error = CigraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A CI schema backend
pub trait Renderer {
    /// Schema this renderer produces
    fn format(&self) -> CiFormat;

    /// Conventional location of the document, relative to the project root
    fn default_path(&self) -> &'static str;

    /// Images used when nothing was pinned or recovered for a role
    fn default_images(&self) -> ImageSet;

    /// Render steps, already in execution order, into the document body
    fn render(&self, steps: &[PlannedStep]) -> CigraphResult<String>;

    /// Substring markers classifying images into roles, tested in order
    fn markers(&self) -> &'static [Marker];

    /// `(step, image)` pairs of a previously rendered document, in document order
    fn step_images(&self, artifact: &str) -> CigraphResult<Vec<(String, String)>>;

    /// Recover pinned images from a previously rendered document.
    ///
    /// Steps named in `skip` are ignored; their images were set explicitly
    /// and say nothing about a role.
    fn extract(&self, artifact: &str, skip: &BTreeSet<String>) -> CigraphResult<ImageSet> {
        let images = self.step_images(artifact)?;
        Ok(ImageSet::classify_all(
            images
                .iter()
                .filter(|(step, _)| !skip.contains(step))
                .map(|(_, image)| image.as_str()),
            self.markers(),
        ))
    }
}

/// Create the renderer for a format, configured from the definition
pub fn renderer_for(format: CiFormat, definition: &PipelineDefinition) -> Box<dyn Renderer> {
    match format {
        CiFormat::Drone => Box::new(DroneRenderer::new(definition.drone.clone())),
        CiFormat::Circle => Box::new(CircleRenderer::new(definition.circle.clone())),
    }
}

/// Extract images, degrading to an empty set when the artifact is unusable
pub fn extract_or_empty(renderer: &dyn Renderer, artifact: &str, skip: &BTreeSet<String>) -> ImageSet {
    match renderer.extract(artifact, skip) {
        Ok(images) => {
            tracing::debug!(
                format = %renderer.format(),
                recovered = images.len(),
                "Recovered images from existing config"
            );
            images
        }
        Err(e) => {
            tracing::warn!(
                format = %renderer.format(),
                error = %e,
                "Error reading existing config - continuing without it"
            );
            ImageSet::new()
        }
    }
}

/// Render the full document: header comment followed by the body
pub fn render_artifact(
    renderer: &dyn Renderer,
    header: &str,
    steps: &[PlannedStep],
) -> CigraphResult<String> {
    let body = renderer.render(steps)?;
    if header.trim().is_empty() {
        return Ok(body);
    }

    let mut out = String::with_capacity(header.len() + body.len() + 4);
    for line in header.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&body);
    Ok(out)
}
