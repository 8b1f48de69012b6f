//! Apply command implementation
//!
//! The apply command runs the whole reconciliation:
//! 1. Load the selected definitions
//! 2. Connect to the store and detect its version
//! 3. Compare every alias and print the report
//! 4. Create, update or migrate, in alias order, stopping at the first failure
//!
//! The report is printed before the store is touched, even with `--quiet`.
//! Nothing is applied when any alias could not be compared, or in dry-run mode.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::io::IsTerminal;
use std::time::Instant;

use index_reconciler::apply::{Applier, Outcome};
use index_reconciler::decision::Action;
use index_reconciler::output::{Marker, OutputConfig};
use index_reconciler::plan::Plan;
use index_reconciler::report;
use index_reconciler::store::TimestampNamer;
use index_reconciler::suggestions;

use super::{DefinitionArgs, ReconcileArgs, StoreArgs};

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub definitions: DefinitionArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub reconcile: ReconcileArgs,

    /// Report the decisions without changing the store
    #[arg(short = 'n', long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Apply without asking for confirmation when a migration is pending
    #[arg(short, long)]
    pub yes: bool,

    /// Hide the spinner and status lines; the report is still printed
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let start_time = Instant::now();

    let definitions = super::load_definitions(&args.definitions)?;
    let gateway = super::connect(&args.store)?;
    let plan = super::build_plan(&*gateway, &definitions, &args.reconcile, args.quiet);

    println!("{}", report_before_apply(&out, &plan, args.dry_run, args.quiet));

    if plan.has_failures() {
        return Err(suggestions::comparison_failed(&plan.failures));
    }
    if args.dry_run || !plan.has_changes() {
        return Ok(());
    }

    let migrations = plan.count(Action::Migrate);
    if migrations > 0 && !args.yes && std::io::stdin().is_terminal() {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "{} alias(es) will be migrated to new indices. Continue?",
                migrations
            ))
            .default(false)
            .interact()?;
        if !proceed {
            println!("Aborted. Nothing was applied.");
            return Ok(());
        }
    }

    let applier = Applier::new(&*gateway, &TimestampNamer);
    let outcomes = applier.apply_all(&plan.tasks)?;

    if !args.quiet {
        println!();
        for outcome in outcomes.iter().filter(|o| o.action.is_mutation()) {
            println!("{}", describe(&out, outcome));
        }
        println!(
            "{} Applied {} change(s) in {:.2}s",
            out.marker(Marker::Success),
            outcomes.iter().filter(|o| o.action.is_mutation()).count(),
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

fn report_before_apply(out: &OutputConfig, plan: &Plan, dry_run: bool, quiet: bool) -> String {
    let report = report::render_styled(plan, out);
    if dry_run && !quiet {
        format!(
            "{} DRY RUN MODE - No changes will be made\n\n{}",
            out.marker(Marker::DryRun),
            report
        )
    } else {
        report
    }
}

fn describe(out: &OutputConfig, outcome: &Outcome) -> String {
    let index = outcome.index.as_deref().unwrap_or("-");
    match outcome.action {
        Action::Create => format!(
            "{} Created '{}' for alias '{}'",
            out.marker(Marker::Created),
            index,
            outcome.alias
        ),
        Action::Update => format!(
            "{} Updated mappings of '{}' for alias '{}'",
            out.marker(Marker::Updated),
            index,
            outcome.alias
        ),
        Action::Migrate => format!(
            "{} Migrated alias '{}' to '{}'",
            out.marker(Marker::Migrated),
            outcome.alias,
            index
        ),
        Action::None => format!("Alias '{}' unchanged", outcome.alias),
    }
}
