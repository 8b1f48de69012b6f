//! Index definitions and the set of definitions a run reconciles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::settings;
use crate::tree::{Tree, Value};

/// The mappings and settings of one index.
///
/// Settings are always normalized on construction, whether the definition
/// was built in code, loaded from a file, or fetched from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDefinition")]
pub struct IndexDefinition {
    #[serde(skip_serializing_if = "Tree::is_empty")]
    pub mappings: Tree,
    #[serde(skip_serializing_if = "Tree::is_empty")]
    pub settings: Tree,
}

#[derive(Deserialize)]
struct RawDefinition {
    #[serde(default)]
    mappings: Option<serde_json::Value>,
    #[serde(default)]
    settings: Option<serde_json::Value>,
}

impl TryFrom<RawDefinition> for IndexDefinition {
    type Error = String;

    fn try_from(raw: RawDefinition) -> std::result::Result<Self, Self::Error> {
        Ok(IndexDefinition::new(
            section_tree("mappings", raw.mappings)?,
            section_tree("settings", raw.settings)?,
        ))
    }
}

/// An absent or null section is empty; anything but an object is rejected.
fn section_tree(
    section: &str,
    json: Option<serde_json::Value>,
) -> std::result::Result<Tree, String> {
    match Value::from(json.unwrap_or(serde_json::Value::Null)) {
        Value::Tree(tree) => Ok(tree),
        other => Err(format!("`{}` must be a mapping, found a {}", section, other.shape())),
    }
}

impl IndexDefinition {
    pub fn new(mappings: Tree, settings: Tree) -> Self {
        Self {
            mappings,
            settings: settings::normalize(&settings),
        }
    }

    /// Request body used to create a physical index from this definition.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "mappings": crate::tree::tree_to_json(&self.mappings),
            "settings": crate::tree::tree_to_json(&self.settings),
        })
    }
}

/// Desired definitions keyed by definition name.
///
/// Iteration is always by name, ascending, which fixes the order in which
/// aliases are compared, reported and applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionSet {
    definitions: BTreeMap<String, IndexDefinition>,
}

impl DefinitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: IndexDefinition) {
        self.definitions.insert(name.into(), definition);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&IndexDefinition> {
        self.definitions.get(name).ok_or_else(|| Error::Loader {
            path: name.to_string(),
            message: format!("cannot find configuration for index '{}'", name),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexDefinition)> {
        self.definitions.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Keep only the named definitions. Every name must exist.
    pub fn select<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        let mut selected = DefinitionSet::new();
        for name in names {
            let name = name.as_ref();
            let definition = self.definitions.remove(name).ok_or_else(|| Error::Loader {
                path: name.to_string(),
                message: format!("cannot find configuration for index '{}'", name),
            })?;
            selected.insert(name, definition);
        }
        Ok(selected)
    }

    /// Keep only definitions whose name matches the glob pattern.
    pub fn filter_glob(self, pattern: &str) -> Result<Self> {
        let pattern = glob::Pattern::new(pattern)?;
        Ok(Self {
            definitions: self
                .definitions
                .into_iter()
                .filter(|(name, _)| pattern.matches(name))
                .collect(),
        })
    }
}

impl FromIterator<(String, IndexDefinition)> for DefinitionSet {
    fn from_iter<I: IntoIterator<Item = (String, IndexDefinition)>>(iter: I) -> Self {
        Self {
            definitions: iter.into_iter().collect(),
        }
    }
}
