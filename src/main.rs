// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! cigraph - CI pipeline step graph builder
//!
//! Order an unordered set of CI steps and render them as a Drone or CircleCI config.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cigraph::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cigraph=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Generate {
            plan,
            output,
            stdout,
        } => cigraph::cli::generate::run(plan, output, stdout, cli.verbose).await,
        Commands::Check { plan, output } => {
            cigraph::cli::generate::check(plan, output, cli.verbose).await
        }
        Commands::Order { plan } => cigraph::cli::order::run(plan, cli.verbose).await,
        Commands::Graph { plan, output } => {
            cigraph::cli::graph::run(plan, output, cli.verbose).await
        }
        Commands::Validate { plan } => cigraph::cli::validate::run(plan, cli.verbose).await,
        Commands::Extract {
            artifact,
            format,
            output,
        } => cigraph::cli::extract::run(artifact, format, output, cli.verbose).await,
    }
}
