//! CLI module for drivesched - command-line interface and subcommands.
//!
//! Provides the entry point for running a simulated workload through the
//! scheduler and for inspecting the effective configuration.

pub mod commands;

pub use commands::Cli;
