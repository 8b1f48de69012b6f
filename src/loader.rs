//! # Definition Loading
//!
//! Desired index definitions live in a directory tree, one file per
//! definition. The file stem is the definition name, so
//! `configs/catalog/products.yaml` defines `products`:
//!
//! ```yaml
//! mappings:
//!   properties:
//!     id: { type: integer }
//! settings:
//!   number_of_shards: 3
//! ```
//!
//! ## Key Components
//!
//! - **[`DefinitionLoader`]**: the trait every format implements. Walking the
//!   directory and building the [`DefinitionSet`] is shared; a format only
//!   parses file content.
//! - **[`YamlLoader`]** (`yml`, `yaml`) and **[`JsonLoader`]** (`json`).
//! - **[`LoaderRegistry`]**: picks a loader by format name.
//!
//! Files are visited recursively in file name order. Two files with the same
//! stem anywhere in the tree are rejected rather than silently overriding
//! each other.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::definition::{DefinitionSet, IndexDefinition};
use crate::error::{Error, Result};
use crate::store::validate_index_name;

/// Loads desired definitions of one file format from a base directory.
pub trait DefinitionLoader: Send + Sync {
    /// File extensions this loader reads, without the leading dot.
    fn supports(&self) -> &'static [&'static str];

    /// Directory the definitions are read from.
    fn base_path(&self) -> &Path;

    /// Parse the content of one definition file.
    fn parse(&self, content: &str) -> Result<IndexDefinition>;

    /// Load every definition under the base directory.
    fn load_all(&self) -> Result<DefinitionSet> {
        let files = list_definition_files(self.base_path(), self.supports())?;
        debug!(
            "found {} definition file(s) under {}",
            files.len(),
            self.base_path().display()
        );

        let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut set = DefinitionSet::new();
        for path in files {
            let name = definition_name(&path)?;
            if let Some(previous) = seen.get(&name) {
                return Err(loader_error(
                    &path,
                    format!(
                        "definition '{}' is also defined in {}",
                        name,
                        previous.display()
                    ),
                ));
            }

            let content = fs::read_to_string(&path).map_err(|e| loader_error(&path, e.to_string()))?;
            if content.trim().is_empty() {
                return Err(loader_error(&path, "definition file is empty".to_string()));
            }
            let definition = self
                .parse(&content)
                .map_err(|e| loader_error(&path, e.to_string()))?;

            seen.insert(name.clone(), path);
            set.insert(name, definition);
        }
        Ok(set)
    }

    /// Load a single definition by name.
    fn load(&self, name: &str) -> Result<IndexDefinition> {
        self.load_all()?.get(name).cloned()
    }
}

/// Loader for YAML definition files.
#[derive(Debug, Clone)]
pub struct YamlLoader {
    base_path: PathBuf,
}

impl YamlLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl DefinitionLoader for YamlLoader {
    fn supports(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }

    fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn parse(&self, content: &str) -> Result<IndexDefinition> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Loader for JSON definition files.
#[derive(Debug, Clone)]
pub struct JsonLoader {
    base_path: PathBuf,
}

impl JsonLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl DefinitionLoader for JsonLoader {
    fn supports(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn parse(&self, content: &str) -> Result<IndexDefinition> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Registered loaders, looked up by format name.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn DefinitionLoader>>,
}

impl LoaderRegistry {
    /// A registry with the YAML and JSON loaders reading from `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        let base_path = base_path.as_ref();
        Self {
            loaders: vec![
                Box::new(YamlLoader::new(base_path)),
                Box::new(JsonLoader::new(base_path)),
            ],
        }
    }

    /// Every format name some loader accepts.
    pub fn formats(&self) -> Vec<&'static str> {
        self.loaders
            .iter()
            .flat_map(|loader| loader.supports().iter().copied())
            .collect()
    }

    /// The loader for a format name (`yaml`, `yml`, `json`).
    pub fn by_format(&self, format: &str) -> Result<&dyn DefinitionLoader> {
        let format = format.trim_start_matches('.').to_lowercase();
        self.loaders
            .iter()
            .find(|loader| loader.supports().contains(&format.as_str()))
            .map(|loader| loader.as_ref())
            .ok_or_else(|| Error::Loader {
                path: format.clone(),
                message: format!(
                    "unsupported definition format '{}' (supported: {})",
                    format,
                    self.formats().join(", ")
                ),
            })
    }
}

fn loader_error(path: &Path, message: String) -> Error {
    Error::Loader {
        path: path.display().to_string(),
        message,
    }
}

fn definition_name(path: &Path) -> Result<String> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| loader_error(path, "file name is not valid UTF-8".to_string()))?;
    validate_index_name(name).map_err(|e| loader_error(path, e.to_string()))?;
    Ok(name.to_string())
}

/// Files under `base` whose extension is one of `extensions`, in walk order.
fn list_definition_files(base: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Err(loader_error(base, "definition directory does not exist".to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let supported = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if supported {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
