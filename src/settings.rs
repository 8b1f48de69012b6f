//! # Settings Normalization
//!
//! The store reports index settings nested under an `index` key and salts
//! them with values it generated itself (creation date, uuid, ...). Users, on
//! the other hand, usually write the common settings at the top level:
//!
//! ```yaml
//! settings:
//!   number_of_shards: 3
//!   refresh_interval: 5s
//! ```
//!
//! [`normalize`] rewrites either form into one canonical shape so the two can
//! be compared key by key:
//!
//! 1. Store-generated identity keys ([`METADATA_KEYS`]) are removed from the
//!    `index` sub-tree.
//! 2. Top-level keys listed in [`RELOCATABLE_KEYS`] are moved under `index`.
//!    Dotted keys such as `blocks.read_only` are expanded into nested trees
//!    (`index.blocks.read_only`), which is how the store reports them.
//! 3. An `index` sub-tree left empty by the steps above is dropped, so a
//!    definition without settings matches an index the store created for it.
//! 4. Leaf values become strings. The store reports `number_of_shards: 3` as
//!    `"3"` and `blocks.read_only: true` as `"true"`; YAML keeps them typed.
//!
//! Normalization never fails and is idempotent.

use crate::tree::{Scalar, Tree, Value};

/// Key under which the store nests index-level settings.
pub const INDEX_KEY: &str = "index";

/// Keys the store assigns at creation time. They never carry user intent.
pub const METADATA_KEYS: &[&str] = &["creation_date", "provided_name", "uuid", "version"];

/// Index-level settings users may write at the top level of `settings`.
pub const RELOCATABLE_KEYS: &[&str] = &[
    "number_of_shards",
    "shard.check_on_startup",
    "codec",
    "routing_partition_size",
    "load_fixed_bitset_filters_eagerly",
    "number_of_replicas",
    "auto_expand_replicas",
    "refresh_interval",
    "max_result_window",
    "max_inner_result_window",
    "max_rescore_window",
    "max_docvalue_fields_search",
    "max_script_fields",
    "max_ngram_diff",
    "max_shingle_diff",
    "blocks.read_only",
    "blocks.read_only_allow_delete",
    "blocks.read",
    "blocks.write",
    "blocks.metadata",
    "max_refresh_listeners",
    "highlight.max_analyzed_offset",
    "max_terms_count",
    "routing.allocation.enable",
    "routing.rebalance.enable",
    "gc_deletes",
    "max_regex_length",
    "default_pipeline",
];

/// Produce the canonical form of a settings tree.
///
/// The input is left untouched; a normalized copy is returned.
pub fn normalize(settings: &Tree) -> Tree {
    let mut normalized = settings.clone();
    remove_metadata(&mut normalized);
    relocate_under_index(&mut normalized);
    drop_empty_index(&mut normalized);
    for value in normalized.values_mut() {
        stringify(value);
    }
    normalized
}

fn remove_metadata(settings: &mut Tree) {
    if let Some(index) = settings.get_mut(INDEX_KEY).and_then(Value::as_tree_mut) {
        for key in METADATA_KEYS {
            index.remove(*key);
        }
    }
}

fn relocate_under_index(settings: &mut Tree) {
    let present: Vec<&str> = RELOCATABLE_KEYS
        .iter()
        .copied()
        .filter(|key| settings.contains_key(*key))
        .collect();
    if present.is_empty() {
        return;
    }

    let index = settings
        .entry(INDEX_KEY.to_string())
        .or_insert_with(|| Value::Tree(Tree::new()));
    // A scalar `index` cannot receive children; leave the keys where they are
    // and let the differ report what it sees.
    if index.as_tree().is_none() {
        return;
    }

    for key in present {
        if let Some(value) = settings.remove(key) {
            if let Some(index) = settings.get_mut(INDEX_KEY).and_then(Value::as_tree_mut) {
                insert_dotted(index, key, value);
            }
        }
    }
}

fn drop_empty_index(settings: &mut Tree) {
    if matches!(settings.get(INDEX_KEY), Some(Value::Tree(index)) if index.is_empty()) {
        settings.remove(INDEX_KEY);
    }
}

/// Replace every scalar leaf with its string form.
fn stringify(value: &mut Value) {
    match value {
        Value::Scalar(Scalar::String(_)) => {}
        Value::Scalar(scalar) => *scalar = Scalar::String(scalar.to_string()),
        Value::Tree(tree) => tree.values_mut().for_each(stringify),
        Value::Sequence(items) => items.iter_mut().for_each(stringify),
    }
}

/// Insert `value` at the dotted `key`, creating intermediate trees.
///
/// If an intermediate segment already holds a non-tree value the key is
/// stored flat instead.
fn insert_dotted(target: &mut Tree, key: &str, value: Value) {
    let segments: Vec<&str> = key.split('.').collect();
    if let Some((last, parents)) = segments.split_last() {
        if can_nest(target, parents) {
            let mut current = target;
            for segment in parents {
                current = match current
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Tree(Tree::new()))
                {
                    Value::Tree(tree) => tree,
                    _ => return,
                };
            }
            current.insert(last.to_string(), value);
        } else {
            target.insert(key.to_string(), value);
        }
    }
}

fn can_nest(target: &Tree, parents: &[&str]) -> bool {
    let mut current = target;
    for segment in parents {
        match current.get(*segment) {
            None => return true,
            Some(Value::Tree(tree)) => current = tree,
            Some(_) => return false,
        }
    }
    true
}
