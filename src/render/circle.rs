// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! CircleCI renderer
//!
//! Steps become jobs; dependencies live in the `main` workflow as `requires`.
//! Jobs share files through the workspace: the checkout job persists the
//! tree, every other job attaches it unless it opts out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::images::{ImageRole, ImageSet, Marker};
use super::{CiFormat, Renderer};
use crate::errors::CigraphResult;
use crate::pipeline::PlannedStep;

pub const CIRCLE_FILE_PATH: &str = ".circleci/config.yml";

const WORKSPACE_ROOT: &str = ".";

const MARKERS: &[Marker] = &[
    Marker::new("bufbuild", &[ImageRole::Buf]),
    Marker::new("cimg/base", &[ImageRole::Util, ImageRole::Img]),
    Marker::new("git", &[ImageRole::Git]),
    Marker::new("golang", &[ImageRole::Go]),
    Marker::new("node", &[ImageRole::Js]),
    Marker::new("sqlc", &[ImageRole::Sqlc]),
    Marker::new("task-fetcher", &[ImageRole::FetchTask]),
];

/// Document-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleSettings {
    /// Name of the workflow tying jobs together
    pub workflow: String,

    /// Tag filter applied to every workflow job
    pub tag_filter: String,

    /// Enable docker layer caching for jobs that need docker
    pub docker_layer_caching: bool,
}

impl Default for CircleSettings {
    fn default() -> Self {
        Self {
            workflow: "main".into(),
            tag_filter: "/.*/".into(),
            docker_layer_caching: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleConfig {
    pub version: String,
    pub jobs: BTreeMap<String, CircleJob>,
    pub workflows: CircleWorkflows,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleJob {
    pub docker: Vec<CircleDocker>,
    pub steps: Vec<CircleJobStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleDocker {
    pub image: String,
}

/// One entry of a job's step list; exactly one field is set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircleJobStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CircleCheckout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach_workspace: Option<CircleAttachWorkspace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_remote_docker: Option<CircleSetupRemoteDocker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_cache: Option<CircleRestoreCache>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<CircleRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_cache: Option<CircleSaveCache>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_to_workspace: Option<CirclePersistToWorkspace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleCheckout {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleAttachWorkspace {
    pub at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleSetupRemoteDocker {
    pub docker_layer_caching: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleRestoreCache {
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleRun {
    pub command: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleSaveCache {
    pub key: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CirclePersistToWorkspace {
    pub root: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleWorkflows {
    pub version: u32,
    #[serde(flatten)]
    pub workflows: BTreeMap<String, CircleWorkflow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleWorkflow {
    pub jobs: Vec<BTreeMap<String, CircleWorkflowJob>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleWorkflowJob {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    pub filters: CircleFilters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleFilters {
    pub tags: CircleTagFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleTagFilter {
    pub only: String,
}

#[derive(Debug, Default, Deserialize)]
struct CircleImages {
    #[serde(default)]
    jobs: BTreeMap<String, CircleJobImages>,
}

#[derive(Debug, Default, Deserialize)]
struct CircleJobImages {
    #[serde(default)]
    docker: Vec<CircleDockerImage>,
}

#[derive(Debug, Deserialize)]
struct CircleDockerImage {
    #[serde(default)]
    image: String,
}

/// Renderer for `.circleci/config.yml`
#[derive(Debug, Clone, Default)]
pub struct CircleRenderer {
    settings: CircleSettings,
}

impl CircleRenderer {
    pub fn new(settings: CircleSettings) -> Self {
        Self { settings }
    }

    fn job(&self, step: &PlannedStep) -> CircleJob {
        let mut steps = Vec::new();

        if step.checkout {
            steps.push(CircleJobStep {
                checkout: Some(CircleCheckout {
                    path: WORKSPACE_ROOT.into(),
                }),
                ..Default::default()
            });
        } else if !step.no_workspace {
            steps.push(CircleJobStep {
                attach_workspace: Some(CircleAttachWorkspace {
                    at: WORKSPACE_ROOT.into(),
                }),
                ..Default::default()
            });
        }

        if step.needs_docker {
            steps.push(CircleJobStep {
                setup_remote_docker: Some(CircleSetupRemoteDocker {
                    docker_layer_caching: self.settings.docker_layer_caching,
                }),
                ..Default::default()
            });
        }

        let cache = step.cache.clone().unwrap_or_default();

        if !cache.restore_keys.is_empty() {
            steps.push(CircleJobStep {
                restore_cache: Some(CircleRestoreCache {
                    keys: cache.restore_keys.clone(),
                }),
                ..Default::default()
            });
        }

        if !step.commands.is_empty() {
            steps.push(CircleJobStep {
                run: Some(CircleRun {
                    command: step.commands.join("\n"),
                    environment: step.environment.clone(),
                }),
                ..Default::default()
            });
        }

        if let Some(key) = cache.save_key.as_ref().filter(|_| !cache.save_paths.is_empty()) {
            steps.push(CircleJobStep {
                save_cache: Some(CircleSaveCache {
                    key: key.clone(),
                    paths: cache.save_paths.clone(),
                }),
                ..Default::default()
            });
        }

        if !step.persist.is_empty() {
            steps.push(CircleJobStep {
                persist_to_workspace: Some(CirclePersistToWorkspace {
                    root: WORKSPACE_ROOT.into(),
                    paths: step.persist.clone(),
                }),
                ..Default::default()
            });
        }

        CircleJob {
            docker: vec![CircleDocker {
                image: step.image.clone(),
            }],
            steps,
        }
    }

    /// Build the document model for the given steps
    pub fn config(&self, steps: &[PlannedStep]) -> CircleConfig {
        let mut jobs = BTreeMap::new();
        let mut workflow_jobs = Vec::with_capacity(steps.len());

        for step in steps {
            jobs.insert(step.name.clone(), self.job(step));

            let mut entry = BTreeMap::new();
            entry.insert(
                step.name.clone(),
                CircleWorkflowJob {
                    requires: step.dependencies.clone(),
                    filters: CircleFilters {
                        tags: CircleTagFilter {
                            only: self.settings.tag_filter.clone(),
                        },
                    },
                },
            );
            workflow_jobs.push(entry);
        }

        let mut workflows = BTreeMap::new();
        workflows.insert(
            self.settings.workflow.clone(),
            CircleWorkflow {
                jobs: workflow_jobs,
            },
        );

        CircleConfig {
            version: "2.1".into(),
            jobs,
            workflows: CircleWorkflows {
                version: 2,
                workflows,
            },
        }
    }
}

impl Renderer for CircleRenderer {
    fn format(&self) -> CiFormat {
        CiFormat::Circle
    }

    fn default_path(&self) -> &'static str {
        CIRCLE_FILE_PATH
    }

    fn default_images(&self) -> ImageSet {
        ImageSet::from_pairs([
            (ImageRole::Buf, "docker.io/bufbuild/buf:1.48.0"),
            (ImageRole::FetchTask, "ghcr.io/markormesher/task-fetcher:v0.4.1"),
            (ImageRole::Git, "docker.io/alpine/git:v2.47.1"),
            (ImageRole::Go, "docker.io/golang:1.23.4"),
            (ImageRole::Img, "cimg/base:2024.12"),
            (ImageRole::Js, "docker.io/node:23.5.0-slim"),
            (ImageRole::Sqlc, "docker.io/sqlc/sqlc:1.28.0"),
            (ImageRole::Util, "cimg/base:2024.12"),
        ])
    }

    fn render(&self, steps: &[PlannedStep]) -> CigraphResult<String> {
        serde_yaml::to_string(&self.config(steps)).map_err(Into::into)
    }

    fn markers(&self) -> &'static [Marker] {
        MARKERS
    }

    fn step_images(&self, artifact: &str) -> CigraphResult<Vec<(String, String)>> {
        let parsed = serde_yaml::from_str::<Option<CircleImages>>(artifact)?.unwrap_or_default();

        // Only the primary container of each job identifies its role.
        Ok(parsed
            .jobs
            .into_iter()
            .filter_map(|(name, job)| job.docker.into_iter().next().map(|d| (name, d.image)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use crate::pipeline::CacheSpec;

    fn planned(name: &str, deps: &[&str]) -> PlannedStep {
        PlannedStep {
            name: name.into(),
            image: "cimg/base:2024.12".into(),
            commands: vec![format!("./task {}", name)],
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            ..PlannedStep::default()
        }
    }

    fn step_keys(job: &CircleJob) -> Vec<&'static str> {
        job.steps
            .iter()
            .map(|s| {
                if s.checkout.is_some() {
                    "checkout"
                } else if s.attach_workspace.is_some() {
                    "attach_workspace"
                } else if s.setup_remote_docker.is_some() {
                    "setup_remote_docker"
                } else if s.restore_cache.is_some() {
                    "restore_cache"
                } else if s.run.is_some() {
                    "run"
                } else if s.save_cache.is_some() {
                    "save_cache"
                } else {
                    "persist_to_workspace"
                }
            })
            .collect()
    }

    #[test]
    fn test_workflow_requires() {
        let renderer = CircleRenderer::default();
        let out = renderer
            .render(&[planned("checkout", &[]), planned("fetch-task", &["checkout"])])
            .unwrap();

        let parsed: CircleConfig = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed.version, "2.1");
        assert_eq!(parsed.workflows.version, 2);

        let main = &parsed.workflows.workflows["main"];
        assert_eq!(main.jobs.len(), 2);
        assert!(main.jobs[0]["checkout"].requires.is_empty());
        assert_eq!(main.jobs[1]["fetch-task"].requires, vec!["checkout"]);
        assert_eq!(main.jobs[1]["fetch-task"].filters.tags.only, "/.*/");
    }

    #[test]
    fn test_job_step_layout() {
        let mut checkout = planned("checkout", &[]);
        checkout.commands.clear();
        checkout.checkout = true;
        checkout.persist = vec![".".into()];

        let mut deps = planned("deps-go", &["checkout"]);
        deps.cache = Some(CacheSpec {
            restore_keys: vec!["deps-go-v5-".into()],
            save_key: Some("deps-go-v5-{{ checksum \"go.sum\" }}".into()),
            save_paths: vec!["/.go".into()],
        });

        let mut img = planned("imgbuild-imgpush", &["deps-go"]);
        img.needs_docker = true;

        let mut all = planned("ci-all", &["imgbuild-imgpush"]);
        all.no_workspace = true;

        let config = CircleRenderer::default().config(&[checkout, deps, img, all]);

        assert_eq!(step_keys(&config.jobs["checkout"]), vec!["checkout", "persist_to_workspace"]);
        assert_eq!(
            step_keys(&config.jobs["deps-go"]),
            vec!["attach_workspace", "restore_cache", "run", "save_cache"]
        );
        assert_eq!(
            step_keys(&config.jobs["imgbuild-imgpush"]),
            vec!["attach_workspace", "setup_remote_docker", "run"]
        );
        assert_eq!(step_keys(&config.jobs["ci-all"]), vec!["run"]);
    }

    #[test]
    fn test_commands_joined_into_one_run() {
        let mut step = planned("lint-go", &[]);
        step.commands = vec!["export GOPATH=/.go".into(), "./task lint-go".into()];
        step.environment.insert("CGO_ENABLED".into(), "0".into());

        let config = CircleRenderer::default().config(&[step]);
        let run = config.jobs["lint-go"].steps[1].run.as_ref().unwrap();
        assert_eq!(run.command, "export GOPATH=/.go\n./task lint-go");
        assert_eq!(run.environment["CGO_ENABLED"], "0");
    }

    #[test]
    fn test_extract_images() {
        let artifact = r#"
version: "2.1"
jobs:
  checkout:
    docker:
      - image: cimg/base:2025.01
  lint-js:
    docker:
      - image: docker.io/node:22.0.0-slim
      - image: docker.io/postgres:16
  no-docker:
    machine: true
workflows:
  version: 2
"#;
        let images = CircleRenderer::default().extract(artifact, &BTreeSet::new()).unwrap();
        assert_eq!(images.get(ImageRole::Util), Some("cimg/base:2025.01"));
        assert_eq!(images.get(ImageRole::Img), Some("cimg/base:2025.01"));
        assert_eq!(images.get(ImageRole::Js), Some("docker.io/node:22.0.0-slim"));
        assert_eq!(images.len(), 3);
    }

    #[test]
    fn test_extract_skips_explicit_image_jobs() {
        let artifact = r#"
version: "2.1"
jobs:
  build-go:
    docker:
      - image: docker.io/golang:1.22.5
  custom-go:
    docker:
      - image: ghcr.io/acme/golang-tools:3
"#;
        let skip = BTreeSet::from(["custom-go".to_string()]);
        let images = CircleRenderer::default().extract(artifact, &skip).unwrap();
        assert_eq!(images.get(ImageRole::Go), Some("docker.io/golang:1.22.5"));
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_defaults_classify_to_own_role() {
        let defaults = CircleRenderer::default().default_images();
        for (role, image) in defaults.iter() {
            let recovered = ImageSet::classify_all([image], MARKERS);
            assert_eq!(recovered.get(role), Some(image), "role {}", role);
        }
    }
}
