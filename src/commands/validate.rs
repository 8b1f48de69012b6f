//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which loads and
//! normalizes the definition files without contacting the store.
//!
//! ## Functionality
//!
//! - **Parsing**: every definition file of the selected format must parse
//!   into mappings and settings.
//! - **Naming**: definition names must be usable as index names.
//! - **Selection**: `--index-names` and `--filter` are checked the same way
//!   `plan` and `apply` check them.
//!
//! This command is a safe, read-only operation.

use anyhow::Result;
use clap::Args;

use index_reconciler::definition::IndexDefinition;
use index_reconciler::output::{Marker, OutputConfig};
use index_reconciler::tree::Value;

use super::DefinitionArgs;

/// Validate definition files without contacting the store
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub definitions: DefinitionArgs,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{} Validating {} definitions in {}",
        out.marker(Marker::Scan),
        args.definitions.format,
        args.definitions.path.display()
    );

    let definitions = match super::load_definitions(&args.definitions) {
        Ok(definitions) => definitions,
        Err(e) => {
            println!("{} Validation failed", out.marker(Marker::Failure));
            return Err(e);
        }
    };

    for (name, definition) in definitions.iter() {
        println!("  {} {}", out.marker(Marker::Success), describe(name, definition));
    }
    println!(
        "{} {} definition(s) are valid",
        out.marker(Marker::Success),
        definitions.len()
    );
    Ok(())
}

fn describe(name: &str, definition: &IndexDefinition) -> String {
    let fields = definition
        .mappings
        .get("properties")
        .and_then(Value::as_tree)
        .map_or(0, |properties| properties.len());
    let settings = definition
        .settings
        .get("index")
        .and_then(Value::as_tree)
        .map_or(0, |index| index.len());
    format!("{}: {} field(s), {} index setting(s)", name, fields, settings)
}
