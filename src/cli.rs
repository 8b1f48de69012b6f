//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::process::ExitCode;

use crate::commands;
use index_reconciler::store::elastic::STORE_LOG_TARGET;

/// Index Reconciler - Converge search-index aliases onto declared schemas
#[derive(Parser, Debug)]
#[command(name = "index-reconciler")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Log every store request and response
    #[arg(long, global = true, alias = "elasticsearch-debug", env = "ELASTICSEARCH_DEBUG")]
    store_debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare definitions with the store, report, then converge the store
    Apply(commands::apply::ApplyArgs),

    /// Compare definitions with the store and report, without changing anything
    Plan(commands::plan::PlanArgs),

    /// Load and normalize definitions without contacting the store
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<ExitCode> {
        self.init_logging();

        match self.command {
            Commands::Apply(args) => commands::apply::execute(args, &self.color).map(|_| ExitCode::SUCCESS),
            Commands::Plan(args) => commands::plan::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color).map(|_| ExitCode::SUCCESS),
            Commands::Completions(args) => commands::completions::execute(args).map(|_| ExitCode::SUCCESS),
        }
    }

    fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        let mut builder = env_logger::Builder::from_env(env);
        if self.store_debug {
            builder.filter_module(STORE_LOG_TARGET, LevelFilter::Trace);
        }
        // A logger may already be installed when running under a test harness.
        let _ = builder.format_timestamp(None).try_init();
    }
}
