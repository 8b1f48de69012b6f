//! # Index Reconciler CLI
//!
//! This is the binary entry point for the `index-reconciler` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments and environment variables using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Turning the command result into a process exit code.
//!
//! The reconciliation logic is defined in the `lib.rs` library crate, ensuring
//! that the binary is a thin wrapper around the reusable library functionality.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    cli.execute()
}
