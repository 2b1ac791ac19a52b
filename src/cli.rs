// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `schedsim`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "schedsim",
    version,
    about = "Simulate multi-core scheduling of a task dependency graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workload file (TOML, or JSON with a `.json` extension).
    #[arg(long, value_name = "PATH", default_value = "Workload.toml")]
    pub workload: String,

    /// Number of simulated cores; overrides `[config].cores`.
    #[arg(long, value_name = "N")]
    pub cores: Option<usize>,

    /// Simulation horizon in ticks; overrides `[config].horizon`.
    #[arg(long, value_name = "T")]
    pub horizon: Option<u64>,

    /// Ready-queue policy: fcfs, pas or all.
    #[arg(long, value_name = "POLICY")]
    pub scheduling: Option<String>,

    /// Core allocation policy: static, dynamic or all.
    #[arg(long, value_name = "POLICY")]
    pub allocation: Option<String>,

    /// Priority gained per tick of waiting under PAS.
    #[arg(long, value_name = "F")]
    pub aging_factor: Option<f64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCHEDSIM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph, but don't simulate.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the JSON response on a single line.
    #[arg(long)]
    pub compact: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
