//! # Decision Engine
//!
//! Classifies what must happen to converge a live index onto a desired
//! definition:
//!
//! | Live state | Differences | Soft update | Action |
//! |---|---|---|---|
//! | no alias | - | - | `Create` |
//! | alias exists | none | - | `None` |
//! | alias exists | only new fields | enabled | `Update` |
//! | alias exists | anything else | - | `Migrate` |
//!
//! A soft update pushes new mappings into the existing index. It is only
//! possible when every change adds a brand-new field under a `properties`
//! key (at the document root or inside an `object`/`nested` field). Any
//! settings change, field type change, or field removal needs a new
//! physical index.

use std::fmt;

use log::debug;

use crate::change::{filter_reportable, Change, ChangeKind, ChangeSet, MAPPINGS_ROOT, SETTINGS_ROOT};
use crate::definition::IndexDefinition;
use crate::diff::diff;
use crate::error::Result;
use crate::settings::normalize;

/// The action required for one alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    None,
    Create,
    Update,
    Migrate,
}

impl Action {
    /// Whether applying this action touches the store.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::None)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::None => "None",
            Action::Create => "Create",
            Action::Update => "Update",
            Action::Migrate => "Migrate",
        };
        write!(f, "{}", label)
    }
}

/// An action together with the changes that led to it.
///
/// `Create` carries no changes: the whole definition is new.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub changes: ChangeSet,
}

impl Decision {
    pub fn new(action: Action, changes: ChangeSet) -> Self {
        Self { action, changes }
    }
}

/// Compute the filtered change set between two definitions.
///
/// Settings are normalized on both sides before comparing; mappings are
/// compared as they are.
pub fn compare(current: &IndexDefinition, desired: &IndexDefinition) -> Result<ChangeSet> {
    let mut changes = diff(
        &normalize(&current.settings),
        &normalize(&desired.settings),
        SETTINGS_ROOT,
    )?;
    changes.extend(diff(&current.mappings, &desired.mappings, MAPPINGS_ROOT)?);
    Ok(filter_reportable(changes))
}

/// Whether a single change can be applied in place.
pub fn is_soft_change(change: &Change) -> bool {
    if change.is_settings() {
        return false;
    }

    if change.is_mappings() {
        let len = change.path.len();
        let under_properties = len >= 2 && change.path[len - 2] == "properties";
        return under_properties && change.kind == ChangeKind::Create;
    }

    true
}

/// Decides the action for one alias.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    allow_soft_update: bool,
}

impl DecisionEngine {
    pub fn new(allow_soft_update: bool) -> Self {
        Self { allow_soft_update }
    }

    /// Classify the change from `current` (absent when the alias does not
    /// exist) to `desired`.
    ///
    /// A comparison error is returned as is; no action is assumed for it.
    pub fn decide(
        &self,
        current: Option<&IndexDefinition>,
        desired: &IndexDefinition,
    ) -> Result<Decision> {
        let Some(current) = current else {
            return Ok(Decision::new(Action::Create, ChangeSet::new()));
        };

        let changes = compare(current, desired)?;
        if changes.is_empty() {
            return Ok(Decision::new(Action::None, changes));
        }

        if self.allow_soft_update && changes.iter().all(is_soft_change) {
            debug!("{} change(s) qualify for a soft update", changes.len());
            return Ok(Decision::new(Action::Update, changes));
        }

        Ok(Decision::new(Action::Migrate, changes))
    }
}

/// Free-function form of [`DecisionEngine::decide`].
pub fn decide(
    current: Option<&IndexDefinition>,
    desired: &IndexDefinition,
    allow_soft_update: bool,
) -> Result<Decision> {
    DecisionEngine::new(allow_soft_update).decide(current, desired)
}
