//! # Index Reconciler Library
//!
//! Declarative schema management for search-index aliases. Users describe
//! the mappings and settings each alias should have; the library compares
//! those definitions with what a live store reports and converges the store
//! onto them, preferring the least disruptive operation.
//!
//! ## Quick Example
//!
//! ```
//! use index_reconciler::decision::{decide, Action};
//! use index_reconciler::definition::IndexDefinition;
//!
//! let current: IndexDefinition = serde_json::from_str(
//!     r#"{"mappings": {"properties": {"title": {"type": "text"}}},
//!         "settings": {"index": {"number_of_shards": "1", "uuid": "Zx1"}}}"#,
//! ).unwrap();
//! let desired: IndexDefinition = serde_json::from_str(
//!     r#"{"mappings": {"properties": {"title": {"type": "text"}, "tags": {"type": "keyword"}}},
//!         "settings": {"number_of_shards": "1"}}"#,
//! ).unwrap();
//!
//! // A new field is additive: it can be pushed into the live index.
//! let decision = decide(Some(&current), &desired, true).unwrap();
//! assert_eq!(decision.action, Action::Update);
//! assert_eq!(decision.changes[0].to_string(), "CREATE => mappings.properties.tags");
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration trees (`tree`)**: the tagged value type both sides are
//!   expressed in.
//! - **Settings normalization (`settings`)**: removes store-generated keys and
//!   nests top-level index settings under `index`.
//! - **Structural diff (`diff`, `change`)**: path-addressed differences between
//!   two trees, minus the store's default noise.
//! - **Decision engine (`decision`)**: `None`, `Create`, `Update` or `Migrate`.
//! - **Store gateway (`store`)**: the trait the engine talks through, with an
//!   in-memory store and an HTTP client for 6.x/7.x clusters.
//! - **Planning and applying (`plan`, `apply`)**: compare every alias, then
//!   execute the decisions in alias order.
//!
//! ## Execution Flow
//!
//! 1.  **Load**: read desired definitions from disk (`loader`).
//! 2.  **Compare**: resolve each alias to its physical index, fetch the live
//!     definition and decide (`plan`).
//! 3.  **Report**: render every decision with its changes (`report`).
//! 4.  **Apply**: unless running in report-only mode, create, update or
//!     migrate, stopping at the first failure (`apply`).

pub mod apply;
pub mod change;
pub mod decision;
pub mod defaults;
pub mod definition;
pub mod diff;
pub mod error;
pub mod loader;
pub mod output;
pub mod plan;
pub mod report;
pub mod settings;
pub mod store;
pub mod suggestions;
pub mod tree;

#[cfg(test)]
mod tree_proptest;
