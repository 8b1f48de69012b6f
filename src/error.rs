//! # Error Handling
//!
//! This module defines the centralized error type for the reconciler. It uses
//! `thiserror` to build one `Error` enum covering every failure mode of a
//! reconciliation run, each variant carrying enough context (alias, index,
//! operation) to diagnose a failure without re-running with verbose logging.
//!
//! ## Taxonomy
//!
//! - **`Loader`**: malformed or missing desired definitions. Fatal before any
//!   comparison starts.
//! - **`StoreQuery`**: an alias or index lookup failed for a reason other than
//!   "not found". Fatal for that alias during comparison.
//! - **`Comparison`**: two configuration trees have incompatible shapes at the
//!   same path. Fatal for that alias.
//! - **`AmbiguousAlias`** / **`UnboundAlias`**: the alias does not resolve to
//!   exactly one physical index.
//! - **`Apply`**: a store mutation failed. Aborts the rest of the apply run.
//!
//! The remaining variants describe configuration problems or wrap errors from
//! the libraries the reconciler builds on.

use thiserror::Error;

/// Main error type for reconciliation operations
#[derive(Error, Debug)]
pub enum Error {
    /// A desired definition could not be loaded or parsed.
    #[error("Loader error for {path}: {message}")]
    Loader { path: String, message: String },

    /// A read against the store failed.
    #[error("Store query error: {operation} on '{target}' - {message}")]
    StoreQuery {
        operation: String,
        target: String,
        message: String,
    },

    /// Live and desired trees disagree on the shape of a value.
    ///
    /// The engine cannot decide which side is authoritative when, for
    /// example, one side holds a scalar and the other a nested tree.
    #[error("Comparison error at {path}: cannot compare {current} with {desired}")]
    Comparison {
        path: String,
        current: String,
        desired: String,
    },

    /// The alias is bound to more than one physical index.
    #[error("Alias '{alias}' targets more than one index ({}), which is not supported", indices.join(", "))]
    AmbiguousAlias { alias: String, indices: Vec<String> },

    /// The alias is not bound to any physical index.
    #[error("Alias '{alias}' does not target any index")]
    UnboundAlias { alias: String },

    /// A store mutation failed while applying a decision.
    #[error("Apply error for alias '{alias}' ({action}): {operation} failed - {message}")]
    Apply {
        alias: String,
        action: String,
        operation: String,
        message: String,
    },

    /// A physical index with this name already exists.
    #[error("Index '{index}' already exists")]
    IndexExists { index: String },

    /// The physical index does not exist.
    #[error("Index '{index}' not found")]
    IndexNotFound { index: String },

    /// The store reported a major version no wire dialect exists for.
    #[error("Store version '{version}' is not supported (supported majors: 6, 7)")]
    UnsupportedVersion { version: String },

    /// An alias or index name breaks the store's naming rules.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The store could not be reached or answered with an unexpected status.
    #[error("Store transport error: {message}")]
    Transport { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),

    /// An HTTP client error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// Wrap any error raised by a store mutation into an [`Error::Apply`].
    pub fn apply(alias: &str, action: impl ToString, operation: &str, source: &Error) -> Self {
        Error::Apply {
            alias: alias.to_string(),
            action: action.to_string(),
            operation: operation.to_string(),
            message: source.to_string(),
        }
    }

    /// Whether this error belongs to the comparison family (shape conflicts).
    pub fn is_comparison(&self) -> bool {
        matches!(self, Error::Comparison { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
