//! # Apply Orchestration
//!
//! Executes the decisions of a [`Plan`](crate::plan::Plan) against the
//! store, one alias at a time, in the order given:
//!
//! | Action | Store operations |
//! |---|---|
//! | `None` | nothing |
//! | `Create` | create a new physical index, bind the alias to it |
//! | `Update` | push the desired mappings into the current index |
//! | `Migrate` | create a new physical index, reindex into it, rebind the alias |
//!
//! The first failure stops the run; later aliases are left untouched and
//! nothing is rolled back. A migration never deletes the index the alias
//! pointed to before: it stays in the store for manual inspection and cleanup.

use log::{info, warn};

use crate::decision::Action;
use crate::error::{Error, Result};
use crate::plan::ReconciliationTask;
use crate::store::{IndexNamer, StoreGateway};

/// What applying one task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub alias: String,
    pub action: Action,
    /// The physical index the alias points to afterwards, when the task
    /// touched the store.
    pub index: Option<String>,
}

/// Runs reconciliation tasks against a store.
pub struct Applier<'a> {
    gateway: &'a dyn StoreGateway,
    namer: &'a dyn IndexNamer,
}

impl<'a> Applier<'a> {
    pub fn new(gateway: &'a dyn StoreGateway, namer: &'a dyn IndexNamer) -> Self {
        Self { gateway, namer }
    }

    /// Apply tasks in order, stopping at the first failure.
    pub fn apply_all(&self, tasks: &[ReconciliationTask]) -> Result<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            outcomes.push(self.apply(task)?);
        }
        Ok(outcomes)
    }

    /// Apply a single task.
    pub fn apply(&self, task: &ReconciliationTask) -> Result<Outcome> {
        let alias = task.alias.as_str();
        let action = task.action();
        let wrap = |operation: &'static str| move |e: Error| Error::apply(alias, action, operation, &e);

        let index = match action {
            Action::None => None,
            Action::Create => {
                let index = self.namer.next_name(alias);
                self.gateway
                    .create_index(&index, &task.desired)
                    .map_err(wrap("create index"))?;
                self.gateway
                    .bind_alias(alias, &index)
                    .map_err(wrap("bind alias"))?;
                info!("created index '{}' for alias '{}'", index, alias);
                Some(index)
            }
            Action::Update => {
                let index = current_index(task).map_err(wrap("resolve current index"))?;
                self.gateway
                    .update_mappings(index, &task.desired.mappings)
                    .map_err(wrap("update mappings"))?;
                info!("updated mappings of index '{}' for alias '{}'", index, alias);
                Some(index.to_string())
            }
            Action::Migrate => {
                let source = current_index(task).map_err(wrap("resolve current index"))?;
                let index = self.namer.next_name(alias);
                self.gateway
                    .create_index(&index, &task.desired)
                    .map_err(wrap("create index"))?;
                self.reindex_with_retry(source, &index)
                    .map_err(wrap("reindex"))?;
                self.gateway
                    .rebind_alias(alias, &index)
                    .map_err(wrap("rebind alias"))?;
                info!(
                    "migrated alias '{}' from '{}' to '{}'; '{}' was kept",
                    alias, source, index, source
                );
                Some(index)
            }
        };

        Ok(Outcome {
            alias: alias.to_string(),
            action,
            index,
        })
    }

    /// Reindex, retrying exactly once on failure.
    fn reindex_with_retry(&self, source: &str, dest: &str) -> Result<()> {
        match self.gateway.reindex(source, dest) {
            Ok(()) => Ok(()),
            Err(first) => {
                warn!(
                    "reindex from '{}' to '{}' failed, retrying once: {}",
                    source, dest, first
                );
                self.gateway.reindex(source, dest)
            }
        }
    }
}

fn current_index(task: &ReconciliationTask) -> Result<&str> {
    task.current_index
        .as_deref()
        .ok_or_else(|| Error::UnboundAlias {
            alias: task.alias.clone(),
        })
}
