//! # Structural Diff
//!
//! Computes the ordered list of [`Change`]s that turn one configuration tree
//! into another. Both trees are walked together, key by key:
//!
//! - key only in `desired` → `Create` carrying the desired value
//! - key only in `current` → `Delete` carrying the current value
//! - two differing scalars → `Update`
//! - two trees → recurse
//! - two sequences → compared element by element, by position
//!
//! A key whose two values have different shapes (a scalar on one side and a
//! tree on the other, for instance) cannot be reconciled automatically and is
//! reported as [`Error::Comparison`]. Sequences get no reordering detection:
//! moving an element shows up as updates at every shifted position.

use std::collections::BTreeSet;

use crate::change::{Change, ChangeSet};
use crate::error::{Error, Result};
use crate::tree::{Tree, Value};

/// Maximum nesting depth walked before a subtree is compared as a whole.
const MAX_DIFF_DEPTH: usize = 128;

/// Diff two trees, prefixing every change path with `root`.
pub fn diff(current: &Tree, desired: &Tree, root: &str) -> Result<ChangeSet> {
    let mut changes = ChangeSet::new();
    let mut path = vec![root.to_string()];
    diff_trees(current, desired, &mut path, &mut changes, 0)?;
    Ok(changes)
}

fn diff_trees(
    current: &Tree,
    desired: &Tree,
    path: &mut Vec<String>,
    changes: &mut ChangeSet,
    depth: usize,
) -> Result<()> {
    let keys: BTreeSet<&String> = current.keys().chain(desired.keys()).collect();

    for key in keys {
        path.push(key.clone());
        match (current.get(key), desired.get(key)) {
            (Some(c), Some(d)) => diff_values(c, d, path, changes, depth + 1)?,
            (Some(c), None) => changes.push(Change::delete(path.clone(), c.clone())),
            (None, Some(d)) => changes.push(Change::create(path.clone(), d.clone())),
            (None, None) => {}
        }
        path.pop();
    }

    Ok(())
}

fn diff_values(
    current: &Value,
    desired: &Value,
    path: &mut Vec<String>,
    changes: &mut ChangeSet,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DIFF_DEPTH {
        if current != desired {
            changes.push(Change::update(path.clone(), current.clone(), desired.clone()));
        }
        return Ok(());
    }

    match (current, desired) {
        (Value::Scalar(c), Value::Scalar(d)) => {
            if c != d {
                changes.push(Change::update(path.clone(), current.clone(), desired.clone()));
            }
        }
        (Value::Tree(c), Value::Tree(d)) => diff_trees(c, d, path, changes, depth)?,
        (Value::Sequence(c), Value::Sequence(d)) => {
            for position in 0..c.len().max(d.len()) {
                path.push(position.to_string());
                match (c.get(position), d.get(position)) {
                    (Some(ci), Some(di)) => diff_values(ci, di, path, changes, depth + 1)?,
                    (Some(ci), None) => changes.push(Change::delete(path.clone(), ci.clone())),
                    (None, Some(di)) => changes.push(Change::create(path.clone(), di.clone())),
                    (None, None) => {}
                }
                path.pop();
            }
        }
        _ => {
            return Err(Error::Comparison {
                path: path.join("."),
                current: current.shape().to_string(),
                desired: desired.shape().to_string(),
            });
        }
    }

    Ok(())
}
