//! # Reconciliation Planning
//!
//! The comparison phase of a run. For every desired definition the
//! [`Planner`] resolves the alias, reads the live definition behind it and
//! asks the [`DecisionEngine`] what to do. The result is a [`Plan`]: one
//! [`ReconciliationTask`] per alias that could be compared, and one
//! [`AliasFailure`] per alias that could not.
//!
//! Planning never mutates the store. A failure for one alias does not stop
//! the others from being compared, so a single run reports every problem.
//!
//! ## Parallelism
//!
//! With `parallelism > 1` the aliases are compared on a dedicated `rayon`
//! pool of that many threads. Results keep alias order either way.

use log::{debug, warn};
use rayon::prelude::*;

use crate::decision::{Action, Decision, DecisionEngine};
use crate::defaults;
use crate::definition::{DefinitionSet, IndexDefinition};
use crate::error::{Error, Result};
use crate::store::{resolve_alias_name, validate_index_name, StoreGateway};

/// Knobs of the comparison phase.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Prefix joined to every definition name with `-` to form the alias.
    pub alias_prefix: String,
    /// Allow in-place mapping updates for purely additive field changes.
    pub allow_soft_update: bool,
    /// Number of aliases compared concurrently.
    pub parallelism: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            alias_prefix: String::new(),
            allow_soft_update: defaults::DEFAULT_ALLOW_SOFT_UPDATE,
            parallelism: defaults::DEFAULT_PARALLELISM,
        }
    }
}

/// Everything needed to converge one alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationTask {
    pub alias: String,
    /// Physical index currently behind the alias; absent when the alias
    /// does not exist yet.
    pub current_index: Option<String>,
    pub current: Option<IndexDefinition>,
    pub desired: IndexDefinition,
    pub decision: Decision,
}

impl ReconciliationTask {
    pub fn action(&self) -> Action {
        self.decision.action
    }
}

/// An alias that could not be compared.
#[derive(Debug)]
pub struct AliasFailure {
    pub alias: String,
    pub error: Error,
}

/// Outcome of the comparison phase, in alias order.
#[derive(Debug, Default)]
pub struct Plan {
    pub tasks: Vec<ReconciliationTask>,
    pub failures: Vec<AliasFailure>,
}

impl Plan {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Whether applying the plan would touch the store.
    pub fn has_changes(&self) -> bool {
        self.tasks.iter().any(|task| task.action().is_mutation())
    }

    /// Number of tasks resolved to `action`.
    pub fn count(&self, action: Action) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.action() == action)
            .count()
    }
}

/// Compares desired definitions with the live store.
pub struct Planner<'a> {
    gateway: &'a dyn StoreGateway,
    engine: DecisionEngine,
    options: ReconcileOptions,
}

impl<'a> Planner<'a> {
    pub fn new(gateway: &'a dyn StoreGateway, options: ReconcileOptions) -> Self {
        Self {
            gateway,
            engine: DecisionEngine::new(options.allow_soft_update),
            options,
        }
    }

    /// Alias a definition name maps to.
    pub fn alias_for(&self, name: &str) -> String {
        resolve_alias_name(&self.options.alias_prefix, name)
    }

    /// Compare a single definition against the store.
    pub fn plan_alias(&self, name: &str, desired: &IndexDefinition) -> Result<ReconciliationTask> {
        let alias = self.alias_for(name);
        validate_index_name(&alias)?;

        if !self.gateway.alias_exists(&alias)? {
            debug!("alias '{}' does not exist", alias);
            return Ok(ReconciliationTask {
                decision: self.engine.decide(None, desired)?,
                alias,
                current_index: None,
                current: None,
                desired: desired.clone(),
            });
        }

        let index = self.gateway.resolve_physical_index(&alias)?;
        let current = self.gateway.fetch_definition(&index)?;
        let decision = self.engine.decide(Some(&current), desired)?;
        debug!("alias '{}' -> '{}': {}", alias, index, decision.action);

        Ok(ReconciliationTask {
            alias,
            current_index: Some(index),
            current: Some(current),
            desired: desired.clone(),
            decision,
        })
    }

    /// Compare every definition of the set, keeping per-alias errors.
    pub fn plan_all(&self, definitions: &DefinitionSet) -> Plan {
        let entries: Vec<(&String, &IndexDefinition)> = definitions.iter().collect();
        let plan_one = |(name, desired): &(&String, &IndexDefinition)| {
            (self.alias_for(name), self.plan_alias(name, desired))
        };

        let results: Vec<(String, Result<ReconciliationTask>)> = if self.options.parallelism > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.parallelism)
                .build()
            {
                Ok(pool) => pool.install(|| entries.par_iter().map(plan_one).collect()),
                Err(e) => {
                    warn!("cannot start comparison pool, comparing sequentially: {}", e);
                    entries.iter().map(plan_one).collect()
                }
            }
        } else {
            entries.iter().map(plan_one).collect()
        };

        let mut plan = Plan::default();
        for (alias, result) in results {
            match result {
                Ok(task) => plan.tasks.push(task),
                Err(error) => {
                    warn!("cannot compare alias '{}': {}", alias, error);
                    plan.failures.push(AliasFailure { alias, error });
                }
            }
        }
        plan
    }
}
