//! CLI module for Jockey
//!
//! Command-line parsing and handlers for the `jockey` binary. Uses clap for
//! argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod init;
pub mod output;

use crate::types::OrchestrateOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Jockey - investor research orchestrator
///
/// Turns a natural language request into a deduplicated investor list,
/// a CSV export and an outreach draft.
#[derive(Parser, Debug)]
#[command(
    name = "jockey",
    version,
    about = "Jockey - investor research orchestrator",
    long_about = "Turns a natural language request into a deduplicated investor list,\n\
                  a CSV export, suggested meeting slots and an email draft.\n\n\
                  Every run is persisted and can be inspected later with 'run'.",
    after_help = "EXAMPLES:\n    \
                  jockey init                                              # Write jockey.toml and .env.example\n    \
                  jockey orchestrate \"fintech investors in Berlin\"        # Dry run\n    \
                  jockey orchestrate \"...\" --execute --max-results 20     # Allow project creation\n    \
                  jockey run 7d0c6c1e-3f5b-4e0a-9a55-2f0e8a1e4b7d --json   # Inspect a stored run\n    \
                  jockey config --validate"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "jockey.toml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the research workflow for one request
    Orchestrate {
        /// Natural language request, e.g. "seed fintech investors in Berlin"
        query: String,

        /// Leave dry-run mode so side effects such as project creation happen
        #[arg(long)]
        execute: bool,

        /// Upper bound on open-search results
        #[arg(long, default_value_t = 50)]
        max_results: usize,

        /// Skip the email draft
        #[arg(long)]
        no_email: bool,

        /// Skip availability suggestions
        #[arg(long)]
        no_calendar: bool,

        /// Never create a project, even with --execute
        #[arg(long)]
        no_project: bool,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a persisted run
    Run {
        /// Run identifier printed by `orchestrate`
        run_id: String,

        /// Print the run record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Write a starter jockey.toml and .env.example
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Enable Apollo mock mode in the generated config
        #[arg(long)]
        mock: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Map `orchestrate` flags onto request options.
pub fn orchestrate_options(
    execute: bool,
    max_results: usize,
    no_email: bool,
    no_calendar: bool,
    no_project: bool,
) -> OrchestrateOptions {
    OrchestrateOptions {
        dry_run: !execute,
        max_results,
        include_email_draft: !no_email,
        include_calendar: !no_calendar,
        create_project: !no_project,
    }
}
