// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Step definition structures
//!
//! Defines the schema for .cigraph.yaml files: the unordered set of steps a
//! producer hands over, plus document-level settings for each CI format.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::errors::{CigraphError, CigraphResult};
use crate::pipeline::DependencyRule;
use crate::render::{CiFormat, CircleSettings, DroneSettings, ImageRole};

/// Default file name of a step definition
pub const DEFINITION_FILE: &str = ".cigraph.yaml";

/// Step definition from .cigraph.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Definition version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Pipeline name
    #[serde(default = "default_name")]
    pub name: String,

    /// Target format; detected from the repository when absent
    #[serde(default)]
    pub format: Option<CiFormat>,

    /// Output path override, relative to the definition file
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Comment written at the top of the generated file
    #[serde(default = "default_header")]
    pub header: String,

    /// Pinned images; these win over anything recovered from an existing file
    #[serde(default)]
    pub images: BTreeMap<ImageRole, String>,

    /// Drone document settings
    #[serde(default)]
    pub drone: DroneSettings,

    /// CircleCI document settings
    #[serde(default)]
    pub circle: CircleSettings,

    /// Steps, in any order
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

fn default_version() -> String {
    "1".to_string()
}

fn default_name() -> String {
    "default".to_string()
}

fn default_header() -> String {
    "This file is maintained by cigraph - manual edits will be overwritten!".to_string()
}

impl Default for PipelineDefinition {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            format: None,
            output: None,
            header: default_header(),
            images: BTreeMap::new(),
            drone: DroneSettings::default(),
            circle: CircleSettings::default(),
            steps: vec![],
        }
    }
}

impl PipelineDefinition {
    /// Load a definition from a YAML file
    pub fn from_file(path: &Path) -> CigraphResult<Self> {
        if !path.exists() {
            return Err(CigraphError::DefinitionNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CigraphError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a definition from a YAML string
    pub fn from_yaml(yaml: &str) -> CigraphResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Steps that apply to `format`, in definition order
    pub fn steps_for(&self, format: CiFormat) -> Vec<StepSpec> {
        self.steps
            .iter()
            .filter(|s| s.applies_to(format))
            .cloned()
            .collect()
    }

    /// Names of the steps for `format` that carry an explicit image
    pub fn explicit_image_steps(&self, format: CiFormat) -> BTreeSet<String> {
        self.steps
            .iter()
            .filter(|s| s.applies_to(format) && s.has_explicit_image())
            .map(|s| s.name.clone())
            .collect()
    }
}

/// A single pipeline step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSpec {
    /// Step name (unique among the steps of a format)
    pub name: String,

    /// Explicit image reference; wins over `image_role`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Role whose image this step runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_role: Option<ImageRole>,

    /// Shell commands, in order
    #[serde(default)]
    pub commands: Vec<String>,

    /// Environment variables for this step
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Rules selecting the steps this one depends on
    #[serde(default)]
    pub depends_on: Vec<DependencyRule>,

    /// Formats this step is emitted for (all when empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<CiFormat>,

    /// This step checks out the repository
    #[serde(default)]
    pub checkout: bool,

    /// This step needs a docker daemon
    #[serde(default)]
    pub needs_docker: bool,

    /// Do not attach the shared workspace
    #[serde(default)]
    pub no_workspace: bool,

    /// Paths to persist to the shared workspace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub persist: Vec<String>,

    /// Dependency cache hints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSpec>,
}

impl StepSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_role(mut self, role: ImageRole) -> Self {
        self.image_role = Some(role);
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn depends_on(mut self, rule: DependencyRule) -> Self {
        self.depends_on.push(rule);
        self
    }

    /// Whether `image` is set and non-empty
    pub fn has_explicit_image(&self) -> bool {
        self.image.as_ref().is_some_and(|i| !i.is_empty())
    }

    /// Whether this step is emitted for `format`
    pub fn applies_to(&self, format: CiFormat) -> bool {
        self.formats.is_empty() || self.formats.contains(&format)
    }
}

/// Cache key/restore hints for a step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSpec {
    /// Keys tried in order when restoring
    #[serde(default)]
    pub restore_keys: Vec<String>,

    /// Key to save under
    #[serde(default)]
    pub save_key: Option<String>,

    /// Paths to save
    #[serde(default)]
    pub save_paths: Vec<String>,
}
