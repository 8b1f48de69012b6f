//! In-memory store gateway
//!
//! Keeps physical indices (definition plus documents) and alias bindings in
//! process. It mimics the behaviours of a real cluster the engine relies on:
//! generated metadata in index settings, mapping merges on update, alias
//! rebinds that replace the target in one step. Failures can be injected per
//! operation to exercise error paths.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use super::StoreGateway;
use crate::definition::IndexDefinition;
use crate::error::{Error, Result};
use crate::settings::INDEX_KEY;
use crate::tree::{Tree, Value};

/// Gateway operations, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AliasExists,
    ResolvePhysicalIndex,
    FetchDefinition,
    CreateIndex,
    BindAlias,
    RebindAlias,
    UpdateMappings,
    Reindex,
}

/// A physical index held by the memory store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryIndex {
    pub definition: IndexDefinition,
    pub documents: Vec<serde_json::Value>,
}

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, MemoryIndex>,
    aliases: BTreeMap<String, BTreeSet<String>>,
    failures: HashMap<Operation, usize>,
    journal: Vec<String>,
    created: u64,
}

impl State {
    fn take_failure(&mut self, operation: Operation) -> Result<()> {
        if let Some(remaining) = self.failures.get_mut(&operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Transport {
                    message: format!("injected failure for {:?}", operation),
                });
            }
        }
        Ok(())
    }

    fn index(&self, name: &str) -> Result<&MemoryIndex> {
        self.indices.get(name).ok_or_else(|| Error::IndexNotFound {
            index: name.to_string(),
        })
    }
}

/// Store gateway backed by process memory.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "memory store".to_string(),
        })
    }

    /// Seed an index with a definition stored exactly as given.
    pub fn add_index(&self, name: &str, definition: IndexDefinition) -> Result<()> {
        let mut state = self.state()?;
        state.indices.insert(
            name.to_string(),
            MemoryIndex {
                definition,
                documents: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append documents to an existing index.
    pub fn add_documents(&self, index: &str, documents: Vec<serde_json::Value>) -> Result<()> {
        let mut state = self.state()?;
        let entry = state
            .indices
            .get_mut(index)
            .ok_or_else(|| Error::IndexNotFound {
                index: index.to_string(),
            })?;
        entry.documents.extend(documents);
        Ok(())
    }

    /// Bind an alias to an index without any checks. Binding the same alias
    /// twice produces an ambiguous alias.
    pub fn add_alias(&self, alias: &str, index: &str) -> Result<()> {
        let mut state = self.state()?;
        state
            .aliases
            .entry(alias.to_string())
            .or_default()
            .insert(index.to_string());
        Ok(())
    }

    /// Make the next `times` calls of `operation` fail.
    pub fn fail_next(&self, operation: Operation, times: usize) -> Result<()> {
        self.state()?.failures.insert(operation, times);
        Ok(())
    }

    pub fn documents(&self, index: &str) -> Result<Vec<serde_json::Value>> {
        Ok(self.state()?.index(index)?.documents.clone())
    }

    /// The stored definition, including store-generated metadata.
    pub fn stored_definition(&self, index: &str) -> Result<IndexDefinition> {
        Ok(self.state()?.index(index)?.definition.clone())
    }

    pub fn index_names(&self) -> Result<Vec<String>> {
        Ok(self.state()?.indices.keys().cloned().collect())
    }

    pub fn aliased_indices(&self, alias: &str) -> Result<Vec<String>> {
        Ok(self
            .state()?
            .aliases
            .get(alias)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Mutating calls received so far, e.g. `create_index products-1`.
    pub fn journal(&self) -> Result<Vec<String>> {
        Ok(self.state()?.journal.clone())
    }
}

/// Settings as the store reports them: nested under `index`, with metadata.
fn with_generated_metadata(settings: &Tree, index: &str, serial: u64) -> Tree {
    let mut stored = settings.clone();
    let entry = stored
        .entry(INDEX_KEY.to_string())
        .or_insert_with(|| Value::Tree(Tree::new()));
    if let Some(index_settings) = entry.as_tree_mut() {
        index_settings.insert("provided_name".to_string(), Value::from(index));
        index_settings.insert("uuid".to_string(), Value::from(format!("mem-{:08}", serial).as_str()));
        index_settings.insert("creation_date".to_string(), Value::from(serial.to_string().as_str()));
        let mut version = Tree::new();
        version.insert("created".to_string(), Value::from("memory"));
        index_settings.insert("version".to_string(), Value::Tree(version));
    }
    stored
}

/// Merge `update` into `target`, the way a mapping push merges fields.
fn merge_trees(target: &mut Tree, update: &Tree) {
    for (key, value) in update {
        match (target.get_mut(key), value) {
            (Some(Value::Tree(existing)), Value::Tree(incoming)) => merge_trees(existing, incoming),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

impl StoreGateway for MemoryStore {
    fn alias_exists(&self, alias: &str) -> Result<bool> {
        let mut state = self.state()?;
        state.take_failure(Operation::AliasExists)?;
        Ok(state.aliases.get(alias).is_some_and(|set| !set.is_empty()))
    }

    fn resolve_physical_index(&self, alias: &str) -> Result<String> {
        let mut state = self.state()?;
        state.take_failure(Operation::ResolvePhysicalIndex)?;
        let targets: Vec<String> = state
            .aliases
            .get(alias)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        match targets.as_slice() {
            [] => Err(Error::UnboundAlias {
                alias: alias.to_string(),
            }),
            [single] => Ok(single.clone()),
            _ => Err(Error::AmbiguousAlias {
                alias: alias.to_string(),
                indices: targets,
            }),
        }
    }

    fn fetch_definition(&self, index: &str) -> Result<IndexDefinition> {
        let mut state = self.state()?;
        state.take_failure(Operation::FetchDefinition)?;
        let stored = &state.index(index)?.definition;
        Ok(IndexDefinition::new(
            stored.mappings.clone(),
            stored.settings.clone(),
        ))
    }

    fn create_index(&self, index: &str, definition: &IndexDefinition) -> Result<()> {
        let mut state = self.state()?;
        state.take_failure(Operation::CreateIndex)?;
        if state.indices.contains_key(index) {
            return Err(Error::IndexExists {
                index: index.to_string(),
            });
        }

        state.created += 1;
        let serial = state.created;
        let stored = IndexDefinition {
            mappings: definition.mappings.clone(),
            settings: with_generated_metadata(&definition.settings, index, serial),
        };
        state.indices.insert(
            index.to_string(),
            MemoryIndex {
                definition: stored,
                documents: Vec::new(),
            },
        );
        state.journal.push(format!("create_index {}", index));
        debug!("memory store created index {}", index);
        Ok(())
    }

    fn bind_alias(&self, alias: &str, index: &str) -> Result<()> {
        let mut state = self.state()?;
        state.take_failure(Operation::BindAlias)?;
        state.index(index)?;
        if state.aliases.get(alias).is_some_and(|set| !set.is_empty()) {
            return Err(Error::StoreQuery {
                operation: "bind alias".to_string(),
                target: alias.to_string(),
                message: "alias is already bound".to_string(),
            });
        }

        state
            .aliases
            .insert(alias.to_string(), BTreeSet::from([index.to_string()]));
        state.journal.push(format!("bind_alias {} {}", alias, index));
        Ok(())
    }

    fn rebind_alias(&self, alias: &str, new_index: &str) -> Result<()> {
        let mut state = self.state()?;
        state.take_failure(Operation::RebindAlias)?;
        state.index(new_index)?;

        // One assignment: readers see either the old set or the new one.
        state
            .aliases
            .insert(alias.to_string(), BTreeSet::from([new_index.to_string()]));
        state
            .journal
            .push(format!("rebind_alias {} {}", alias, new_index));
        Ok(())
    }

    fn update_mappings(&self, index: &str, mappings: &Tree) -> Result<()> {
        let mut state = self.state()?;
        state.take_failure(Operation::UpdateMappings)?;
        let entry = state
            .indices
            .get_mut(index)
            .ok_or_else(|| Error::IndexNotFound {
                index: index.to_string(),
            })?;
        merge_trees(&mut entry.definition.mappings, mappings);
        state.journal.push(format!("update_mappings {}", index));
        Ok(())
    }

    fn reindex(&self, source: &str, dest: &str) -> Result<()> {
        let mut state = self.state()?;
        state.journal.push(format!("reindex {} {}", source, dest));
        state.take_failure(Operation::Reindex)?;
        let documents = state.index(source)?.documents.clone();
        let target = state
            .indices
            .get_mut(dest)
            .ok_or_else(|| Error::IndexNotFound {
                index: dest.to_string(),
            })?;
        target.documents.extend(documents);
        Ok(())
    }
}
