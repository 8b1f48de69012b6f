//! # Store Gateway
//!
//! The reconciliation engine talks to the document store only through the
//! [`StoreGateway`] trait. This keeps the engine independent of the wire
//! protocol and lets tests swap in an in-memory store.
//!
//! Two implementations ship with the crate:
//!
//! - **[`memory::MemoryStore`]**: indices, documents and alias bindings held
//!   in process. Used by the test suite and for local experiments.
//! - **[`elastic::ElasticGateway`]**: an HTTP client with one wire dialect per
//!   supported store major version. [`elastic::connect`] asks the cluster
//!   once and picks the dialect; nothing above this module ever branches on
//!   the store version.
//!
//! The module also owns naming: how a definition name maps to an alias
//! ([`resolve_alias_name`]) and how new physical index names are generated
//! ([`IndexNamer`]).

use std::time::{SystemTime, UNIX_EPOCH};

use crate::definition::IndexDefinition;
use crate::error::{Error, Result};
use crate::tree::Tree;

pub mod elastic;
pub mod memory;

/// Operations the engine needs from the document store.
///
/// Implementations are used from several threads when comparison runs in
/// parallel, hence the `Send + Sync` bound.
pub trait StoreGateway: Send + Sync {
    /// Whether the alias exists (is bound to at least one index).
    fn alias_exists(&self, alias: &str) -> Result<bool>;

    /// Name of the single physical index behind the alias.
    ///
    /// Fails with [`Error::UnboundAlias`] when the alias targets nothing and
    /// [`Error::AmbiguousAlias`] when it targets several indices.
    fn resolve_physical_index(&self, alias: &str) -> Result<String>;

    /// Live definition of a physical index.
    fn fetch_definition(&self, index: &str) -> Result<IndexDefinition>;

    /// Create a physical index. Fails if the name is taken.
    fn create_index(&self, index: &str, definition: &IndexDefinition) -> Result<()>;

    /// Bind a currently unbound alias to an index.
    fn bind_alias(&self, alias: &str, index: &str) -> Result<()>;

    /// Move the alias to a new index in one atomic store operation.
    fn rebind_alias(&self, alias: &str, new_index: &str) -> Result<()>;

    /// Push a mappings tree into an existing index.
    fn update_mappings(&self, index: &str, mappings: &Tree) -> Result<()>;

    /// Copy every document from `source` to `dest`, blocking until done.
    fn reindex(&self, source: &str, dest: &str) -> Result<()>;
}

impl<G: StoreGateway + ?Sized> StoreGateway for Box<G> {
    fn alias_exists(&self, alias: &str) -> Result<bool> {
        (**self).alias_exists(alias)
    }

    fn resolve_physical_index(&self, alias: &str) -> Result<String> {
        (**self).resolve_physical_index(alias)
    }

    fn fetch_definition(&self, index: &str) -> Result<IndexDefinition> {
        (**self).fetch_definition(index)
    }

    fn create_index(&self, index: &str, definition: &IndexDefinition) -> Result<()> {
        (**self).create_index(index, definition)
    }

    fn bind_alias(&self, alias: &str, index: &str) -> Result<()> {
        (**self).bind_alias(alias, index)
    }

    fn rebind_alias(&self, alias: &str, new_index: &str) -> Result<()> {
        (**self).rebind_alias(alias, new_index)
    }

    fn update_mappings(&self, index: &str, mappings: &Tree) -> Result<()> {
        (**self).update_mappings(index, mappings)
    }

    fn reindex(&self, source: &str, dest: &str) -> Result<()> {
        (**self).reindex(source, dest)
    }
}

/// Alias name for a definition, honouring an optional prefix.
pub fn resolve_alias_name(prefix: &str, definition_name: &str) -> String {
    if prefix.is_empty() {
        definition_name.to_string()
    } else {
        format!("{}-{}", prefix, definition_name)
    }
}

/// Check a name against the store's index and alias naming rules.
pub fn validate_index_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(Error::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return invalid("name must not be empty");
    }
    if name == "." || name == ".." {
        return invalid("name must not be '.' or '..'");
    }
    if name.len() > 255 {
        return invalid("name must not be longer than 255 bytes");
    }
    if name.starts_with(['-', '_', '+']) {
        return invalid("name must not start with '-', '_' or '+'");
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return invalid("name must be lowercase");
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '\\' | '/' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' | ',' | '#' | ':'))
    {
        return invalid(&format!("name must not contain '{}'", c));
    }
    Ok(())
}

/// Source of names for new physical indices.
pub trait IndexNamer: Send + Sync {
    /// A fresh physical index name for the alias.
    fn next_name(&self, alias: &str) -> String;
}

/// Names indices `<alias>-<unix millis>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNamer;

impl IndexNamer for TimestampNamer {
    fn next_name(&self, alias: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{}-{}", alias, millis)
    }
}
