// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for cigraph.

pub mod context;
pub mod extract;
pub mod generate;
pub mod graph;
pub mod order;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::DEFINITION_FILE;
use crate::render::CiFormat;

/// CI pipeline step graph builder
///
/// Turn an unordered set of CI steps into an ordered pipeline description.
#[derive(Parser, Debug)]
#[clap(
    name = "cigraph",
    version,
    about = "Order CI steps by dependency rules and render Drone or CircleCI configs",
    long_about = None,
    after_help = "Examples:\n\
        cigraph generate                Regenerate the CI config in place\n\
        cigraph check                   Fail if the CI config is stale\n\
        cigraph order                   Show the planned step order\n\
        cigraph graph -o mermaid        Show the step graph as mermaid\n\n\
        See 'cigraph <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

/// Options shared by every command that plans a pipeline
#[derive(clap::Args, Debug, Clone)]
pub struct PlanArgs {
    /// Step definition file
    #[clap(short, long, default_value = DEFINITION_FILE, env = "CIGRAPH_DEFINITION")]
    pub definition: PathBuf,

    /// Target CI format (auto, drone, circle)
    #[clap(short, long, default_value = "auto", env = "CIGRAPH_FORMAT")]
    pub format: FormatArg,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the CI config from the step definition
    Generate {
        #[clap(flatten)]
        plan: PlanArgs,

        /// Write to this path instead of the format's default location
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Print the config instead of writing it
        #[clap(long)]
        stdout: bool,
    },

    /// Check that the CI config is up to date
    Check {
        #[clap(flatten)]
        plan: PlanArgs,

        /// Compare against this path instead of the format's default location
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the planned execution order
    Order {
        #[clap(flatten)]
        plan: PlanArgs,
    },

    /// Show the step graph
    Graph {
        #[clap(flatten)]
        plan: PlanArgs,

        /// Output format
        #[clap(short, long, default_value = "text")]
        output: GraphFormat,
    },

    /// Validate the step definition
    Validate {
        #[clap(flatten)]
        plan: PlanArgs,
    },

    /// Show the images recovered from an existing CI config
    Extract {
        /// CI config to read
        artifact: PathBuf,

        /// Format of the config (auto detects from the file name)
        #[clap(short, long, default_value = "auto", env = "CIGRAPH_FORMAT")]
        format: FormatArg,

        /// Output format
        #[clap(short, long, default_value = "text")]
        output: OutputFormat,
    },
}

/// Requested CI format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Auto,
    Format(CiFormat),
}

impl std::str::FromStr for FormatArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<CiFormat>()
            .map(Self::Format)
            .map_err(|e| e.to_string())
    }
}

/// Output format for the extract command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}
