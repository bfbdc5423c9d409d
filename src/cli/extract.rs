// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Extract command - show images recovered from an existing config

use colored::Colorize;
use miette::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{FormatArg, OutputFormat};
use crate::errors::{CigraphError, CigraphResult};
use crate::pipeline::PipelineDefinition;
use crate::render::{renderer_for, CiFormat, ImageRole};

/// Run the extract command
pub async fn run(artifact: PathBuf, format: FormatArg, output: OutputFormat, _verbose: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(&artifact)
        .await
        .map_err(|e| CigraphError::FileReadError {
            path: artifact.clone(),
            error: e.to_string(),
        })?;

    let format = match format {
        FormatArg::Format(format) => format,
        FormatArg::Auto => format_from_path(&artifact)?,
    };

    let renderer = renderer_for(format, &PipelineDefinition::default());
    let images = renderer.extract(&content, &BTreeSet::new())?;

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&images).map_err(CigraphError::from)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!("{} ({})", "Recovered images".bold(), format);
            println!();
            for role in ImageRole::ALL {
                match images.get(role) {
                    Some(image) => println!("  {:<12} {}", role.as_str(), image),
                    None => println!("  {:<12} {}", role.as_str(), "-".dimmed()),
                }
            }
        }
    }

    Ok(())
}

/// Guess the format from a config's conventional file name
fn format_from_path(path: &Path) -> CigraphResult<CiFormat> {
    let is_drone = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(".drone"));
    if is_drone {
        return Ok(CiFormat::Drone);
    }

    if path.components().any(|c| c.as_os_str() == ".circleci") {
        return Ok(CiFormat::Circle);
    }

    Err(CigraphError::FormatDetectionFailed {
        dir: path.to_path_buf(),
    })
}
