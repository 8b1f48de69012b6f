//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `index-reconciler` command-line tool. Each subcommand is defined in its own
//! file to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! Argument groups shared by several commands (where definitions come from,
//! how to reach the store, how to compare) live here and are flattened into
//! the command `Args` structs.

pub mod apply;
pub mod completions;
pub mod plan;
pub mod validate;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use index_reconciler::defaults;
use index_reconciler::definition::DefinitionSet;
use index_reconciler::loader::LoaderRegistry;
use index_reconciler::plan::{Plan, Planner, ReconcileOptions};
use index_reconciler::store::elastic::{self, StoreOptions};
use index_reconciler::store::StoreGateway;
use index_reconciler::suggestions;

/// Where desired definitions are loaded from.
#[derive(Args, Debug, Clone)]
pub struct DefinitionArgs {
    /// Directory holding one definition file per index.
    #[arg(long, value_name = "DIR", env = "INDEX_CONFIG_PATH", default_value = defaults::DEFAULT_CONFIG_PATH)]
    pub path: PathBuf,

    /// Definition file format (yaml, yml or json).
    #[arg(long, value_name = "FORMAT", env = "INDEX_CONFIG_FORMAT", default_value = defaults::DEFAULT_FORMAT)]
    pub format: String,

    /// Only reconcile these definitions (comma separated or repeated).
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    pub index_names: Vec<String>,

    /// Only reconcile definitions whose name matches this glob.
    #[arg(long, value_name = "GLOB")]
    pub filter: Option<String>,
}

/// How to reach the store.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store URL, including scheme and port.
    #[arg(long, value_name = "URL", env = "ELASTICSEARCH_HOST")]
    pub elasticsearch_host: String,

    /// Basic-auth user.
    #[arg(long, value_name = "USER", env = "ELASTICSEARCH_USER")]
    pub elasticsearch_user: Option<String>,

    /// Basic-auth password.
    #[arg(long, value_name = "PASSWORD", env = "ELASTICSEARCH_PASSWORD", hide_env_values = true)]
    pub elasticsearch_password: Option<String>,

    /// Timeout of a single store request, in seconds (reindexing is exempt).
    #[arg(long, value_name = "SECONDS", env = "ELASTICSEARCH_TIMEOUT", default_value_t = defaults::DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,
}

impl StoreArgs {
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            host: self.elasticsearch_host.clone(),
            user: self.elasticsearch_user.clone(),
            password: self.elasticsearch_password.clone(),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }
}

/// How definitions are compared with the store.
#[derive(Args, Debug, Clone)]
pub struct ReconcileArgs {
    /// Prefix joined to every definition name with '-' to form the alias.
    #[arg(long, value_name = "PREFIX", env = "INDEX_PREFIX", default_value = "")]
    pub index_prefix: String,

    /// Enable in-place mapping updates whenever possible.
    #[arg(
        long,
        value_name = "BOOL",
        env = "ENABLE_SOFT_UPDATE",
        default_value_t = defaults::DEFAULT_ALLOW_SOFT_UPDATE,
        action = ArgAction::Set
    )]
    pub enable_soft_update: bool,

    /// Number of aliases compared concurrently.
    #[arg(long, value_name = "N", env = "INDEX_PARALLELISM", default_value_t = defaults::DEFAULT_PARALLELISM)]
    pub parallelism: usize,
}

impl ReconcileArgs {
    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            alias_prefix: self.index_prefix.clone(),
            allow_soft_update: self.enable_soft_update,
            parallelism: self.parallelism.max(1),
        }
    }
}

/// Load the selected definitions, turning common mistakes into hints.
pub fn load_definitions(args: &DefinitionArgs) -> Result<DefinitionSet> {
    if !args.path.is_dir() {
        return Err(suggestions::definitions_not_found(&args.path));
    }

    let registry = LoaderRegistry::new(&args.path);
    let loader = registry
        .by_format(&args.format)
        .map_err(|_| suggestions::unknown_format(&args.format, &registry.formats()))?;
    let mut definitions = loader
        .load_all()
        .with_context(|| format!("Failed to load definitions from {}", args.path.display()))?;

    if !args.index_names.is_empty() {
        if let Some(unknown) = args
            .index_names
            .iter()
            .find(|name| !definitions.contains(name))
        {
            return Err(suggestions::unknown_index_name(unknown, &definitions.names()));
        }
        definitions = definitions.select(&args.index_names)?;
    }

    if let Some(pattern) = &args.filter {
        if let Err(e) = glob::Pattern::new(pattern) {
            return Err(suggestions::invalid_glob(pattern, &e));
        }
        definitions = definitions.filter_glob(pattern)?;
    }

    if definitions.is_empty() && args.index_names.is_empty() && args.filter.is_none() {
        return Err(suggestions::no_definitions(&args.path, &args.format));
    }

    info!("loaded {} definition(s)", definitions.len());
    Ok(definitions)
}

/// Connect to the store described by the arguments.
pub fn connect(args: &StoreArgs) -> Result<Box<dyn StoreGateway>> {
    let options = args.options();
    if let Err(e) = elastic::parse_host(&options.host) {
        return Err(suggestions::invalid_host(&options.host, &e));
    }
    elastic::connect(&options)
        .with_context(|| format!("Failed to connect to store at {}", options.host))
}

/// Compare every definition with the store, showing a spinner on terminals.
pub fn build_plan(
    gateway: &dyn StoreGateway,
    definitions: &DefinitionSet,
    args: &ReconcileArgs,
    quiet: bool,
) -> Plan {
    let spinner = if quiet {
        indicatif::ProgressBar::hidden()
    } else {
        let spinner = indicatif::ProgressBar::new_spinner();
        spinner.set_message(format!("Comparing {} alias(es)...", definitions.len()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };

    let plan = Planner::new(gateway, args.options()).plan_all(definitions);
    spinner.finish_and_clear();
    plan
}
