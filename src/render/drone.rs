// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Drone renderer
//!
//! A single pipeline document with a flat step list; each step names its
//! predecessors in `depends_on`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::images::{ImageRole, ImageSet, Marker};
use super::{CiFormat, Renderer};
use crate::errors::CigraphResult;
use crate::pipeline::PlannedStep;

pub const DRONE_FILE_PATH: &str = ".drone.yml";

const MARKERS: &[Marker] = &[
    Marker::new("bufbuild", &[ImageRole::Buf]),
    Marker::new("busybox", &[ImageRole::Util]),
    Marker::new("git", &[ImageRole::Git]),
    Marker::new("golang", &[ImageRole::Go]),
    Marker::new("node", &[ImageRole::Js]),
    Marker::new("podman", &[ImageRole::Img]),
    Marker::new("sqlc", &[ImageRole::Sqlc]),
    Marker::new("task-fetcher", &[ImageRole::FetchTask]),
];

/// Pipeline-level settings for the rendered document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneSettings {
    /// Pipeline name
    pub pipeline_name: String,

    /// Runner type (`kubernetes`, `docker`, ...)
    pub pipeline_type: String,

    /// Kubernetes namespace for the pipeline
    pub namespace: String,

    /// Image pull policy for every step
    pub pull: String,

    /// Trigger events to include
    pub include_events: Vec<String>,

    /// Trigger events to exclude
    pub exclude_events: Vec<String>,
}

impl Default for DroneSettings {
    fn default() -> Self {
        Self {
            pipeline_name: "default".into(),
            pipeline_type: "kubernetes".into(),
            namespace: "drone-ci".into(),
            pull: "always".into(),
            include_events: vec![],
            exclude_events: vec!["pull_request".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneConfig {
    pub kind: String,
    #[serde(rename = "type")]
    pub pipeline_type: String,
    pub name: String,
    pub metadata: DroneMetadata,
    pub trigger: DroneTrigger,
    pub steps: Vec<DroneStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneMetadata {
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneTrigger {
    pub event: DroneTriggerEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneTriggerEvent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneStep {
    pub name: String,
    pub image: String,
    pub pull: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub commands: Vec<String>,
}

// Only the fields extraction needs; anything else in the file is ignored.
#[derive(Debug, Default, Deserialize)]
struct DroneImages {
    #[serde(default)]
    steps: Vec<DroneStepImage>,
}

#[derive(Debug, Deserialize)]
struct DroneStepImage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: String,
}

/// Renderer for `.drone.yml`
#[derive(Debug, Clone, Default)]
pub struct DroneRenderer {
    settings: DroneSettings,
}

impl DroneRenderer {
    pub fn new(settings: DroneSettings) -> Self {
        Self { settings }
    }

    /// Build the document model for the given steps
    pub fn config(&self, steps: &[PlannedStep]) -> DroneConfig {
        DroneConfig {
            kind: "pipeline".into(),
            pipeline_type: self.settings.pipeline_type.clone(),
            name: self.settings.pipeline_name.clone(),
            metadata: DroneMetadata {
                namespace: self.settings.namespace.clone(),
            },
            trigger: DroneTrigger {
                event: DroneTriggerEvent {
                    include: self.settings.include_events.clone(),
                    exclude: self.settings.exclude_events.clone(),
                },
            },
            steps: steps
                .iter()
                .map(|step| DroneStep {
                    name: step.name.clone(),
                    image: step.image.clone(),
                    pull: self.settings.pull.clone(),
                    depends_on: step.dependencies.clone(),
                    environment: step.environment.clone(),
                    commands: step.commands.clone(),
                })
                .collect(),
        }
    }
}

impl Renderer for DroneRenderer {
    fn format(&self) -> CiFormat {
        CiFormat::Drone
    }

    fn default_path(&self) -> &'static str {
        DRONE_FILE_PATH
    }

    fn default_images(&self) -> ImageSet {
        ImageSet::from_pairs([
            (ImageRole::Buf, "docker.io/bufbuild/buf:1.48.0"),
            (ImageRole::FetchTask, "ghcr.io/markormesher/task-fetcher:v0.4.1"),
            (ImageRole::Git, "docker.io/alpine/git:v2.47.1"),
            (ImageRole::Go, "docker.io/golang:1.23.4"),
            (ImageRole::Img, "quay.io/podman/stable:v5.3.1"),
            (ImageRole::Js, "docker.io/node:23.5.0-slim"),
            (ImageRole::Sqlc, "docker.io/sqlc/sqlc:1.28.0"),
            (ImageRole::Util, "docker.io/busybox:1.37.0"),
        ])
    }

    fn render(&self, steps: &[PlannedStep]) -> CigraphResult<String> {
        serde_yaml::to_string(&self.config(steps)).map_err(Into::into)
    }

    fn markers(&self) -> &'static [Marker] {
        MARKERS
    }

    fn step_images(&self, artifact: &str) -> CigraphResult<Vec<(String, String)>> {
        // A .drone.yml may hold several documents (pipelines, secrets).
        let mut images = Vec::new();
        for document in serde_yaml::Deserializer::from_str(artifact) {
            let parsed = Option::<DroneImages>::deserialize(document)?.unwrap_or_default();
            images.extend(parsed.steps.into_iter().map(|s| (s.name, s.image)));
        }
        Ok(images)
    }
}
