//! boilerctl: replay driver for the steam-boiler supervisor.
//!
//! Feeds scripted inbound batches through the control core cycle by cycle
//! and renders the outbound traffic. The physical plant stays out of scope:
//! this binary replays, it does not simulate.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod scenario;

/// Steam-boiler supervisor replay driver.
#[derive(Parser)]
#[command(name = "boilerctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted scenario through the controller
    Run {
        /// Scenario file (JSON)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Append per-cycle records to this JSONL file
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Print the final metrics snapshot as JSON
        #[arg(long)]
        metrics: bool,
    },

    /// Validate a scenario file without replaying it
    Check {
        /// Scenario file (JSON)
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            scenario,
            log,
            metrics,
        } => scenario::run(scenario, log, metrics),
        Commands::Check { scenario } => scenario::check(scenario),
    }
}
