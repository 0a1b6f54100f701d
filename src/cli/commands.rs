//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - simulate: run a workload against a simulated remote service
//! - config: print the effective configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// drivesched - request scheduler for remote-storage sync
#[derive(Parser, Debug)]
#[command(name = "drivesched")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `simulate`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a mixed workload through the scheduler against a simulated service
    Simulate(SimulateArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for the `simulation` config section
#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    /// Number of metadata jobs
    #[arg(short, long)]
    pub metadata: Option<usize>,

    /// Number of file transfers
    #[arg(short, long)]
    pub files: Option<usize>,

    /// Probability (0.0-1.0) that a call is throttled
    #[arg(short, long)]
    pub throttle_rate: Option<f64>,

    /// Latency of each simulated call in milliseconds
    #[arg(short, long)]
    pub latency_ms: Option<u64>,

    /// Start offline and come online after this many milliseconds
    #[arg(long)]
    pub offline_ms: Option<u64>,

    /// Simulate a cellular connection with background transfers restricted
    #[arg(long)]
    pub metered: bool,

    /// Give up waiting for outstanding jobs after this many seconds [default: 60]
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print final statistics as JSON
    #[arg(long)]
    pub json: bool,
}
