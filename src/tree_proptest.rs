//! Property-based tests for configuration trees, normalization and diffing.
//!
//! These tests use proptest to generate random trees and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::change::ChangeKind;
    use crate::decision::{decide, Action};
    use crate::definition::IndexDefinition;
    use crate::diff::diff;
    use crate::settings::{normalize, INDEX_KEY, METADATA_KEYS, RELOCATABLE_KEYS};
    use crate::tree::Scalar;
    use crate::tree::{tree_to_json, Tree, Value};
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z0-9_]{0,8}".prop_map(|s| Value::from(s.as_str())),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::btree_map("[a-z_]{1,6}", inner.clone(), 0..4).prop_map(Value::Tree),
                prop::collection::vec(inner, 0..3).prop_map(Value::Sequence),
            ]
        })
    }

    fn tree() -> impl Strategy<Value = Tree> {
        prop::collection::btree_map("[a-z_.]{1,8}", value(), 0..5)
    }

    /// Settings keys: mostly the ones normalization treats specially.
    fn settings_key() -> impl Strategy<Value = String> {
        let known: Vec<&'static str> = RELOCATABLE_KEYS
            .iter()
            .chain(METADATA_KEYS)
            .chain(std::iter::once(&INDEX_KEY))
            .copied()
            .collect();
        prop_oneof![
            3 => prop::sample::select(known).prop_map(|key| key.to_string()),
            1 => "[a-z_.]{1,8}",
        ]
    }

    /// A settings tree in either the flat or the store's nested form.
    fn settings_tree() -> impl Strategy<Value = Tree> {
        let index = prop::collection::btree_map(settings_key(), value(), 0..5).prop_map(Value::Tree);
        (
            prop::collection::btree_map(settings_key(), value(), 0..5),
            prop::option::of(index),
        )
            .prop_map(|(mut settings, index)| {
                if let Some(index) = index {
                    settings.insert(INDEX_KEY.to_string(), index);
                }
                settings
            })
    }

    fn only_string_leaves(value: &Value) -> bool {
        match value {
            Value::Scalar(scalar) => matches!(scalar, Scalar::String(_)),
            Value::Tree(tree) => tree.values().all(only_string_leaves),
            Value::Sequence(items) => items.iter().all(only_string_leaves),
        }
    }

    fn count(changes: &[crate::change::Change], kind: ChangeKind) -> usize {
        changes.iter().filter(|c| c.kind == kind).count()
    }

    // ============================================================================
    // diff property tests
    // ============================================================================

    proptest! {
        /// Property: a tree never differs from itself
        #[test]
        fn diff_of_identical_trees_is_empty(t in tree()) {
            prop_assert!(diff(&t, &t, "mappings").unwrap().is_empty());
        }

        /// Property: swapping the sides swaps creates and deletes
        #[test]
        fn diff_is_antisymmetric(a in tree(), b in tree()) {
            if let Ok(forward) = diff(&a, &b, "settings") {
                let backward = diff(&b, &a, "settings").unwrap();
                prop_assert_eq!(count(&forward, ChangeKind::Create), count(&backward, ChangeKind::Delete));
                prop_assert_eq!(count(&forward, ChangeKind::Delete), count(&backward, ChangeKind::Create));
                prop_assert_eq!(count(&forward, ChangeKind::Update), count(&backward, ChangeKind::Update));
            } else {
                prop_assert!(diff(&b, &a, "settings").is_err());
            }
        }

        /// Property: every change path starts with the root label
        #[test]
        fn diff_paths_start_with_root(a in tree(), b in tree()) {
            if let Ok(changes) = diff(&a, &b, "mappings") {
                for change in changes {
                    prop_assert_eq!(change.root(), Some("mappings"));
                    prop_assert!(change.path.len() >= 2);
                }
            }
        }

        /// Property: diff output is deterministic
        #[test]
        fn diff_is_deterministic(a in tree(), b in tree()) {
            let first = diff(&a, &b, "mappings").ok();
            let second = diff(&a, &b, "mappings").ok();
            prop_assert_eq!(first, second);
        }
    }

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: normalizing twice is the same as normalizing once
        #[test]
        fn normalize_is_idempotent(t in settings_tree()) {
            let once = normalize(&t);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Property: no metadata key survives under `index`
        #[test]
        fn normalize_strips_metadata(t in settings_tree(), uuid in "[a-z0-9]{4,8}") {
            let mut with_metadata = t;
            let index = with_metadata
                .entry(INDEX_KEY.to_string())
                .or_insert_with(|| Value::Tree(Tree::new()));
            if let Some(index) = index.as_tree_mut() {
                index.insert("uuid".to_string(), Value::from(uuid.as_str()));
            }

            let normalized = normalize(&with_metadata);
            if let Some(index) = normalized.get(INDEX_KEY).and_then(Value::as_tree) {
                for key in METADATA_KEYS {
                    prop_assert!(!index.contains_key(*key));
                }
            }
        }

        /// Property: an empty `index` never survives normalization
        #[test]
        fn normalize_leaves_no_empty_index(t in settings_tree()) {
            let normalized = normalize(&t);
            prop_assert!(!matches!(normalized.get(INDEX_KEY), Some(Value::Tree(index)) if index.is_empty()));
        }

        /// Property: normalized settings hold strings only, as the store reports them
        #[test]
        fn normalize_stringifies_leaves(t in settings_tree()) {
            for value in normalize(&t).values() {
                prop_assert!(only_string_leaves(value));
            }
        }

        /// Property: relocatable keys never remain at the top level next to an `index` tree
        #[test]
        fn normalize_relocates_known_keys(t in settings_tree()) {
            let normalized = normalize(&t);
            if normalized.get(INDEX_KEY).map_or(true, |index| index.as_tree().is_some()) {
                for key in RELOCATABLE_KEYS {
                    prop_assert!(!normalized.contains_key(*key));
                }
            }
        }
    }

    // ============================================================================
    // conversion and decision property tests
    // ============================================================================

    proptest! {
        /// Property: converting to JSON and back yields the same tree
        #[test]
        fn json_conversion_preserves_trees(t in tree()) {
            prop_assert_eq!(Value::tree_from_json(tree_to_json(&t)), t);
        }

        /// Property: a definition compared with itself needs no action
        #[test]
        fn identical_definitions_decide_none(mappings in tree(), settings in settings_tree()) {
            let definition = IndexDefinition::new(mappings, settings);
            let decision = decide(Some(&definition), &definition, true).unwrap();
            prop_assert_eq!(decision.action, Action::None);
        }
    }
}
