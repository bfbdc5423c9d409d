// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Generate and check commands - render the CI config

use miette::Result;
use std::path::{Path, PathBuf};

use super::context::GenerationContext;
use super::PlanArgs;
use crate::errors::{CigraphError, CigraphResult};
use crate::pipeline::PipelinePlan;
use crate::utils::{print_error, print_success, print_warning};

/// Run the generate command
pub async fn run(args: PlanArgs, output: Option<PathBuf>, stdout: bool, verbose: bool) -> Result<()> {
    let ctx = GenerationContext::load(&args.definition, args.format, output).await?;
    let plan = ctx.plan()?;
    let content = ctx.render(&plan)?;

    if stdout {
        print!("{}", content);
        return Ok(());
    }

    report_unmatched(&plan, verbose);

    if ctx.is_current(&content) {
        print_success(&format!("{} is up to date", ctx.output_path.display()));
        return Ok(());
    }

    write_atomic(&ctx.output_path, &content).await?;

    tracing::info!(
        path = %ctx.output_path.display(),
        format = %ctx.format,
        steps = plan.steps.len(),
        "Wrote CI config"
    );
    print_success(&format!(
        "Wrote {} ({} steps)",
        ctx.output_path.display(),
        plan.steps.len()
    ));

    Ok(())
}

/// Run the check command
pub async fn check(args: PlanArgs, output: Option<PathBuf>, verbose: bool) -> Result<()> {
    let ctx = GenerationContext::load(&args.definition, args.format, output).await?;
    let plan = ctx.plan()?;
    let content = ctx.render(&plan)?;

    report_unmatched(&plan, verbose);

    if ctx.existing.is_none() {
        print_error(&format!("{} does not exist", ctx.output_path.display()));
        return Err(miette::miette!(
            "CI config is missing\n\nRun 'cigraph generate' to create it."
        ));
    }

    if !ctx.is_current(&content) {
        print_error(&format!("{} is out of date", ctx.output_path.display()));
        return Err(miette::miette!(
            "CI config is stale\n\nRun 'cigraph generate' to update it."
        ));
    }

    print_success(&format!("{} is up to date", ctx.output_path.display()));
    Ok(())
}

fn report_unmatched(plan: &PipelinePlan, verbose: bool) {
    for (step, rule) in &plan.unmatched_rules {
        tracing::debug!(step = %step, rule = %rule, "Dependency rule matched nothing");
        if verbose {
            print_warning(&format!("step '{}': rule {} matches no other step", step, rule));
        }
    }
}

/// Write through a sibling temp file so readers never see a partial config
async fn write_atomic(path: &Path, content: &str) -> CigraphResult<()> {
    let write_error = |e: std::io::Error| CigraphError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, content).await.map_err(write_error)?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_error(e));
    }

    Ok(())
}
