// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Order command - show the planned execution order

use colored::Colorize;
use miette::Result;

use super::context::GenerationContext;
use super::PlanArgs;
use crate::utils::{print_section, print_warning};

/// Run the order command
pub async fn run(args: PlanArgs, verbose: bool) -> Result<()> {
    let ctx = GenerationContext::load(&args.definition, args.format, None).await?;
    let plan = ctx.plan()?;

    println!(
        "{} ({} steps, {})",
        "Execution order".bold(),
        plan.steps.len(),
        plan.format
    );
    println!();

    let graph = plan.graph();
    for step in &plan.steps {
        println!(
            "  {}. {} {}",
            step.position + 1,
            step.name.bold(),
            step.image.dimmed()
        );
        if !step.dependencies.is_empty() {
            println!("       depends on: {}", step.dependencies.join(", ").cyan());
        }
        if verbose {
            let dependents = graph.dependents(&step.name);
            if !dependents.is_empty() {
                println!("       needed by: {}", dependents.join(", ").cyan());
            }
            for command in &step.commands {
                println!("       $ {}", command.dimmed());
            }
        }
    }

    if !plan.unmatched_rules.is_empty() {
        print_section("Unmatched rules");
        for (step, rule) in &plan.unmatched_rules {
            print_warning(&format!("step '{}': {}", step, rule));
        }
    }

    Ok(())
}
