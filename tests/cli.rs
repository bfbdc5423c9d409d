// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SCENARIO: &str = r#"
steps:
  - name: all
    image_role: util
    commands: ["echo done"]
    depends_on: ["build|test.*"]
  - name: build
    image_role: go
    commands: ["go build ./..."]
    depends_on: ["fetch"]
  - name: checkout
    image_role: git
    commands: ["git fetch --tags"]
  - name: fetch
    image_role: fetch-task
    commands: ["cp /task ."]
    depends_on: ["checkout"]
"#;

const CYCLE: &str = r#"
steps:
  - name: a
    image_role: util
    depends_on: ["b"]
  - name: b
    image_role: util
    depends_on: ["a"]
"#;

fn cigraph(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cigraph").unwrap();
    cmd.current_dir(dir)
        .env_remove("CIGRAPH_FORMAT")
        .env_remove("CIGRAPH_DEFINITION")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn project(definition: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".cigraph.yaml"), definition).unwrap();
    temp
}

fn step_names(doc: &serde_yaml::Value) -> Vec<String> {
    doc["steps"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_generate_drone_orders_steps() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["generate", "--format", "drone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let content = fs::read_to_string(temp.path().join(".drone.yml")).unwrap();
    assert!(content.starts_with("# This file is maintained by cigraph"));

    let doc: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
    assert_eq!(step_names(&doc), vec!["checkout", "fetch", "build", "all"]);

    let all = &doc["steps"][3];
    assert_eq!(all["depends_on"], serde_yaml::from_str::<serde_yaml::Value>("[build]").unwrap());
    assert_eq!(all["image"].as_str(), Some("docker.io/busybox:1.37.0"));
    assert!(doc["steps"][0].get("depends_on").is_none());
}

#[test]
fn test_generate_is_byte_identical_on_rerun() {
    let temp = project(SCENARIO);

    cigraph(temp.path()).args(["generate", "-f", "drone"]).assert().success();
    let first = fs::read_to_string(temp.path().join(".drone.yml")).unwrap();

    // The existing file now selects the format
    cigraph(temp.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
    let second = fs::read_to_string(temp.path().join(".drone.yml")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_generate_preserves_pinned_images() {
    let temp = project(SCENARIO);
    fs::write(
        temp.path().join(".drone.yml"),
        "kind: pipeline\nsteps:\n  - name: build\n    image: docker.io/golang:1.22.5\n",
    )
    .unwrap();

    cigraph(temp.path()).arg("generate").assert().success();

    let content = fs::read_to_string(temp.path().join(".drone.yml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
    assert_eq!(doc["steps"][2]["name"].as_str(), Some("build"));
    assert_eq!(doc["steps"][2]["image"].as_str(), Some("docker.io/golang:1.22.5"));
    assert_eq!(doc["steps"][0]["image"].as_str(), Some("docker.io/alpine/git:v2.47.1"));
}

#[test]
fn test_explicit_image_does_not_replace_role_image() {
    let temp = project(
        r#"
steps:
  - name: lint-js
    image_role: js
    commands: ["npm run lint"]
  - name: zz-custom
    image: ghcr.io/acme/node-runner:1.0
    commands: ["run"]
"#,
    );

    cigraph(temp.path()).args(["generate", "-f", "drone"]).assert().success();
    let first = fs::read_to_string(temp.path().join(".drone.yml")).unwrap();

    cigraph(temp.path())
        .args(["generate", "-f", "drone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
    let second = fs::read_to_string(temp.path().join(".drone.yml")).unwrap();

    assert_eq!(first, second);

    let doc: serde_yaml::Value = serde_yaml::from_str(&second).unwrap();
    assert_eq!(doc["steps"][0]["name"].as_str(), Some("lint-js"));
    assert_eq!(doc["steps"][0]["image"].as_str(), Some("docker.io/node:23.5.0-slim"));
    assert_eq!(doc["steps"][1]["image"].as_str(), Some("ghcr.io/acme/node-runner:1.0"));
}

#[test]
fn test_generate_circle_is_byte_identical_on_rerun() {
    let temp = project(SCENARIO);
    let path = temp.path().join(".circleci/config.yml");

    cigraph(temp.path()).args(["generate", "--format", "circle"]).assert().success();
    let first = fs::read_to_string(&path).unwrap();

    cigraph(temp.path())
        .args(["generate", "--format", "circle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
    let second = fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_generate_circle_preserves_pinned_images() {
    let temp = project(SCENARIO);
    fs::create_dir(temp.path().join(".circleci")).unwrap();
    fs::write(
        temp.path().join(".circleci/config.yml"),
        "version: 2.1\njobs:\n  all:\n    docker:\n      - image: cimg/base:2025.01\n  build:\n    docker:\n      - image: docker.io/golang:1.22.5\n",
    )
    .unwrap();

    // The existing file selects the format
    cigraph(temp.path()).arg("generate").assert().success();

    let content = fs::read_to_string(temp.path().join(".circleci/config.yml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
    assert_eq!(doc["jobs"]["build"]["docker"][0]["image"].as_str(), Some("docker.io/golang:1.22.5"));
    assert_eq!(doc["jobs"]["all"]["docker"][0]["image"].as_str(), Some("cimg/base:2025.01"));
    assert_eq!(
        doc["jobs"]["checkout"]["docker"][0]["image"].as_str(),
        Some("docker.io/alpine/git:v2.47.1")
    );

    cigraph(temp.path())
        .args(["generate", "--format", "circle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_generate_survives_unparseable_existing_config() {
    let temp = project(SCENARIO);
    fs::write(temp.path().join(".drone.yml"), "steps: [unterminated\n").unwrap();

    cigraph(temp.path()).arg("generate").assert().success();

    let content = fs::read_to_string(temp.path().join(".drone.yml")).unwrap();
    assert!(content.contains("docker.io/golang:1.23.4"));
}

#[test]
fn test_cycle_fails_without_writing() {
    let temp = project(CYCLE);

    cigraph(temp.path())
        .args(["generate", "--format", "drone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency"));

    assert!(!temp.path().join(".drone.yml").exists());
}

#[test]
fn test_unsupported_format_fails() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["generate", "--format", "jenkins"])
        .assert()
        .failure();

    let temp = project("format: jenkins\nsteps: []\n");
    cigraph(temp.path()).arg("generate").assert().failure();
    assert!(!temp.path().join(".drone.yml").exists());
}

#[test]
fn test_format_detection_failure() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to determine CI format"));
}

#[test]
fn test_missing_definition() {
    let temp = TempDir::new().unwrap();

    cigraph(temp.path())
        .args(["order", "--format", "drone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Definition file not found"));
}

#[test]
fn test_generate_circle() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["generate", "--format", "circle"])
        .assert()
        .success();

    let content = fs::read_to_string(temp.path().join(".circleci/config.yml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();

    let jobs: Vec<&str> = doc["jobs"]
        .as_mapping()
        .unwrap()
        .keys()
        .map(|k| k.as_str().unwrap())
        .collect();
    assert_eq!(jobs, vec!["all", "build", "checkout", "fetch"]);

    let workflow: Vec<&str> = doc["workflows"]["main"]["jobs"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|entry| entry.as_mapping().unwrap().keys().next().unwrap().as_str().unwrap())
        .collect();
    assert_eq!(workflow, vec!["checkout", "fetch", "build", "all"]);

    assert_eq!(
        doc["workflows"]["main"]["jobs"][3]["all"]["requires"][0].as_str(),
        Some("build")
    );
    assert_eq!(doc["jobs"]["all"]["docker"][0]["image"].as_str(), Some("cimg/base:2024.12"));
}

#[test]
fn test_stdout_does_not_write() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["generate", "--format", "drone", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: checkout"));

    assert!(!temp.path().join(".drone.yml").exists());
}

#[test]
fn test_check_detects_drift() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["check", "--format", "drone"])
        .assert()
        .failure();

    cigraph(temp.path()).args(["generate", "--format", "drone"]).assert().success();
    cigraph(temp.path()).arg("check").assert().success();

    let path = temp.path().join(".drone.yml");
    let edited = fs::read_to_string(&path).unwrap().replace("echo done", "echo edited");
    fs::write(&path, edited).unwrap();

    cigraph(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("out of date"));
}

#[test]
fn test_definition_from_other_directory() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("repo")).unwrap();
    fs::write(temp.path().join("repo/.cigraph.yaml"), SCENARIO).unwrap();

    cigraph(temp.path())
        .args(["generate", "-d", "repo/.cigraph.yaml", "-f", "drone"])
        .assert()
        .success();

    assert!(temp.path().join("repo/.drone.yml").exists());
}

#[test]
fn test_order_command() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["order", "--format", "drone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. checkout"))
        .stdout(predicate::str::contains("4. all"))
        .stdout(predicate::str::contains("depends on: build"));
}

#[test]
fn test_order_verbose_lists_dependents() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["order", "--format", "drone", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("needed by: fetch"))
        .stdout(predicate::str::contains("needed by: all"))
        .stdout(predicate::str::contains("$ go build ./..."));
}

#[test]
fn test_graph_formats() {
    let temp = project(SCENARIO);

    cigraph(temp.path())
        .args(["graph", "--format", "drone"])
        .assert()
        .success()
        .stdout("1. checkout\n2. fetch [depends: checkout]\n3. build [depends: fetch]\n4. all [depends: build]\n");

    cigraph(temp.path())
        .args(["graph", "--format", "drone", "--output", "dot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"build\" -> \"all\";"));

    cigraph(temp.path())
        .args(["graph", "--format", "drone", "-o", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"));
}

#[test]
fn test_validate() {
    let temp = project(SCENARIO);
    cigraph(temp.path())
        .args(["validate", "--format", "drone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Definition is valid"));

    let temp = project(CYCLE);
    cigraph(temp.path())
        .args(["validate", "--format", "circle"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Circular dependency between: a, b"));
}

#[test]
fn test_extract_json() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".drone.yml"),
        "kind: pipeline\nsteps:\n  - name: a\n    image: docker.io/node:22.0.0\n  - name: b\n    image: docker.io/busybox:1.36.0\n",
    )
    .unwrap();

    let output = cigraph(temp.path())
        .args(["extract", ".drone.yml", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let images: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(images["js"], "docker.io/node:22.0.0");
    assert_eq!(images["util"], "docker.io/busybox:1.36.0");
    assert!(images.get("go").is_none());
}
