//! # Plan Command Implementation
//!
//! Compares every selected definition with the store and prints what `apply`
//! would do. Nothing in the store is changed.
//!
//! With `--detailed-exitcode` the exit status tells scripts whether the
//! store has drifted:
//!
//! - `0`: every alias already matches its definition
//! - `1`: an error occurred, including aliases that could not be compared
//! - `2`: at least one alias would be created, updated or migrated

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use index_reconciler::output::OutputConfig;
use index_reconciler::report;
use index_reconciler::suggestions;

use super::{DefinitionArgs, ReconcileArgs, StoreArgs};

/// Show what apply would change, without changing anything
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub definitions: DefinitionArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub reconcile: ReconcileArgs,

    /// Exit with status 2 when changes are pending.
    #[arg(long)]
    pub detailed_exitcode: bool,

    /// Suppress the progress spinner.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `plan` command.
pub fn execute(args: PlanArgs, color_flag: &str) -> Result<ExitCode> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let definitions = super::load_definitions(&args.definitions)?;
    let gateway = super::connect(&args.store)?;
    let plan = super::build_plan(&*gateway, &definitions, &args.reconcile, args.quiet);

    println!("{}", report::render_styled(&plan, &out));

    if plan.has_failures() {
        return Err(suggestions::comparison_failed(&plan.failures));
    }
    if args.detailed_exitcode && plan.has_changes() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
