//! CLI argument definitions for taskweave.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// taskweave -- run multi-step requests as ordered skill calls.
#[derive(Parser)]
#[command(
    name = "taskweave",
    version,
    about = "taskweave -- complex-task orchestration engine",
    long_about = "Takes the JSON produced by an NLU step, executes each sub-task through \
                  its registered skill in order, and prints what succeeded and what failed."
)]
pub struct Cli {
    /// Path to the configuration file (TOML, or JSON by extension).
    #[arg(long, short, global = true, default_value = "taskweave.toml")]
    pub config: PathBuf,

    /// Emit logs as JSON lines instead of the compact format.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute an NLU response.
    Run {
        /// File holding the NLU JSON, or `-` for stdin.
        #[arg(long, short)]
        input: String,

        /// User on whose behalf skills run.
        #[arg(long, short, default_value = "local")]
        user_id: String,

        /// Print the full report as pretty JSON.
        #[arg(long)]
        json: bool,
    },

    /// List registered intents and whether each one is critical.
    Intents,
}
