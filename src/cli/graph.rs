// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Graph command - visualize the step graph

use miette::Result;

use super::context::GenerationContext;
use super::{GraphFormat, PlanArgs};

/// Run the graph command
pub async fn run(args: PlanArgs, format: GraphFormat, _verbose: bool) -> Result<()> {
    let ctx = GenerationContext::load(&args.definition, args.format, None).await?;
    let plan = ctx.plan()?;
    let graph = plan.graph();

    let output = match format {
        GraphFormat::Text => graph.to_text(),
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    print!("{}", output);

    Ok(())
}
