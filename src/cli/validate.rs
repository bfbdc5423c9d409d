// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Validate command - check the step definition

use colored::Colorize;
use miette::Result;

use super::context::{project_root, resolve_format};
use super::PlanArgs;
use crate::pipeline::{PipelineDefinition, PipelineValidator};
use crate::utils::{print_error, print_section, print_success, print_warning};

/// Run the validate command
pub async fn run(args: PlanArgs, verbose: bool) -> Result<()> {
    println!("{}", "Validating definition...".bold());
    println!();

    let definition = match PipelineDefinition::from_file(&args.definition) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("  {} Failed to parse definition", "✗".red());
            eprintln!();
            return Err(e.into());
        }
    };

    print_success("Definition file is valid YAML");

    let root = project_root(&args.definition);
    let format = resolve_format(args.format, &definition, &root)?;

    let validation = PipelineValidator::validate(&definition, format);

    if !validation.errors.is_empty() {
        print_section("Errors");
        for error in &validation.errors {
            print_error(error);
        }
    }

    if !validation.warnings.is_empty() {
        print_section("Warnings");
        for warning in &validation.warnings {
            print_warning(warning);
        }
    }

    if verbose {
        let steps = definition.steps_for(format);
        print_section("Definition summary");
        println!("  Name: {}", definition.name);
        println!("  Format: {}", format);
        println!("  Steps: {}", steps.len());
        for step in &steps {
            let rules: Vec<String> = step.depends_on.iter().map(|r| r.to_string()).collect();
            let deps = if rules.is_empty() {
                String::new()
            } else {
                format!(" [rules: {}]", rules.join(", "))
            };
            println!("    - {}{}", step.name, deps.dimmed());
        }
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Definition validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Definition is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Definition is valid!".green().bold());
    }
    Ok(())
}
