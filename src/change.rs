//! # Changes
//!
//! A [`Change`] is one typed, path-addressed difference between a live and a
//! desired configuration tree. `path[0]` is always the section the change
//! belongs to (`settings` or `mappings`).
//!
//! This module also holds the change filter: [`Change::should_be_reported`]
//! drops differences that only reflect defaults the store fills in on read.

use std::fmt;

use crate::tree::{Scalar, Value};

/// Root label for changes found in the settings tree.
pub const SETTINGS_ROOT: &str = "settings";

/// Root label for changes found in the mappings tree.
pub const MAPPINGS_ROOT: &str = "mappings";

/// Default string truncation threshold the store assigns to keyword fields.
pub const DEFAULT_IGNORE_ABOVE: f64 = 256.0;

/// What happened at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Create => "CREATE",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        };
        write!(f, "{}", label)
    }
}

/// A single difference between two trees.
///
/// `Create` never carries `from`; `Delete` never carries `to`. Use the
/// constructors to keep that invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    pub path: Vec<String>,
    pub from: Option<Value>,
    pub to: Option<Value>,
}

/// An ordered list of changes. Order is stable for reporting only.
pub type ChangeSet = Vec<Change>;

impl Change {
    pub fn create(path: Vec<String>, to: Value) -> Self {
        Self {
            kind: ChangeKind::Create,
            path,
            from: None,
            to: Some(to),
        }
    }

    pub fn update(path: Vec<String>, from: Value, to: Value) -> Self {
        Self {
            kind: ChangeKind::Update,
            path,
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn delete(path: Vec<String>, from: Value) -> Self {
        Self {
            kind: ChangeKind::Delete,
            path,
            from: Some(from),
            to: None,
        }
    }

    /// Dotted form of the path, e.g. `mappings.properties.title.type`.
    pub fn full_path(&self) -> String {
        self.path.join(".")
    }

    pub fn root(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    pub fn is_settings(&self) -> bool {
        self.root() == Some(SETTINGS_ROOT)
    }

    pub fn is_mappings(&self) -> bool {
        self.root() == Some(MAPPINGS_ROOT)
    }

    /// Whether the change reflects real drift rather than store noise.
    ///
    /// The store reports `ignore_above: 256` on keyword sub-fields even when
    /// the user never set it; its disappearance from the desired mapping is
    /// not a difference.
    pub fn should_be_reported(&self) -> bool {
        let ends_with_ignore_above = self.path.last().map(String::as_str) == Some("ignore_above");
        let from_is_default = self
            .from
            .as_ref()
            .and_then(Value::as_scalar)
            .and_then(Scalar::as_f64)
            == Some(DEFAULT_IGNORE_ABOVE);

        !(self.kind == ChangeKind::Delete
            && self.is_mappings()
            && ends_with_ignore_above
            && from_is_default
            && self.to.is_none())
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.kind, self.full_path())?;

        let from = self.from.as_ref().and_then(Value::as_scalar);
        let to = self.to.as_ref().and_then(Value::as_scalar);
        if let (Some(from), Some(to)) = (from, to) {
            write!(f, " [From: {} - To: {}]", from, to)?;
        }
        Ok(())
    }
}

/// Drop the changes the filter considers noise, keeping order.
pub fn filter_reportable(changes: ChangeSet) -> ChangeSet {
    changes
        .into_iter()
        .filter(Change::should_be_reported)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_constructors_keep_from_to_invariant() {
        let create = Change::create(path(&["mappings", "properties", "a"]), Value::from("x"));
        assert!(create.from.is_none());
        assert!(create.to.is_some());

        let delete = Change::delete(path(&["mappings", "properties", "a"]), Value::from("x"));
        assert!(delete.from.is_some());
        assert!(delete.to.is_none());
    }

    #[test]
    fn test_display_scalar_update() {
        let change = Change::update(
            path(&["mappings", "properties", "field1", "type"]),
            Value::from("text"),
            Value::from("keyword"),
        );
        assert_eq!(
            change.to_string(),
            "UPDATE => mappings.properties.field1.type [From: text - To: keyword]"
        );
    }

    #[test]
    fn test_display_without_values_for_create_and_trees() {
        let create = Change::create(path(&["settings", "index", "codec"]), Value::from("best_compression"));
        assert_eq!(create.to_string(), "CREATE => settings.index.codec");

        let tree_update = Change::update(
            path(&["mappings", "properties"]),
            Value::Tree(Tree::new()),
            Value::from("x"),
        );
        assert_eq!(tree_update.to_string(), "UPDATE => mappings.properties");
    }

    #[test]
    fn test_default_ignore_above_delete_is_filtered() {
        let change = Change::delete(
            path(&["mappings", "properties", "name", "fields", "keyword", "ignore_above"]),
            Value::from(256_i64),
        );
        assert!(!change.should_be_reported());

        let float_change = Change::delete(
            path(&["mappings", "properties", "name", "fields", "keyword", "ignore_above"]),
            Value::Scalar(Scalar::Float(256.0)),
        );
        assert!(!float_change.should_be_reported());
    }

    #[test]
    fn test_non_default_ignore_above_is_reported() {
        let change = Change::delete(
            path(&["mappings", "properties", "name", "ignore_above"]),
            Value::from(512_i64),
        );
        assert!(change.should_be_reported());
    }

    #[test]
    fn test_ignore_above_outside_mappings_is_reported() {
        let change = Change::delete(
            path(&["settings", "index", "ignore_above"]),
            Value::from(256_i64),
        );
        assert!(change.should_be_reported());
    }

    #[test]
    fn test_ignore_above_update_is_reported() {
        let change = Change::update(
            path(&["mappings", "properties", "name", "ignore_above"]),
            Value::from(256_i64),
            Value::from(128_i64),
        );
        assert!(change.should_be_reported());
    }

    #[test]
    fn test_filter_reportable_keeps_order() {
        let changes = vec![
            Change::create(path(&["mappings", "properties", "b"]), Value::from("x")),
            Change::delete(
                path(&["mappings", "properties", "a", "ignore_above"]),
                Value::from(256_i64),
            ),
            Change::create(path(&["mappings", "properties", "c"]), Value::from("y")),
        ];

        let kept = filter_reportable(changes);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].full_path(), "mappings.properties.b");
        assert_eq!(kept[1].full_path(), "mappings.properties.c");
    }
}
