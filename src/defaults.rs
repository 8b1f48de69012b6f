//! Default values for reconciler configuration.
//!
//! Every default lives here so the CLI flags, `StoreOptions` and
//! `ReconcileOptions` cannot drift apart.

use std::path::PathBuf;

/// Directory desired definitions are read from.
pub const DEFAULT_CONFIG_PATH: &str = "./configs";

/// Definition file format.
pub const DEFAULT_FORMAT: &str = "yaml";

/// Whether purely additive mapping changes are applied in place.
pub const DEFAULT_ALLOW_SOFT_UPDATE: bool = true;

/// Number of aliases compared concurrently.
pub const DEFAULT_PARALLELISM: usize = 1;

/// Timeout of a single store request, in seconds. Reindexing is exempt.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Returns the default definition directory.
///
/// This can be overridden by the `--path` CLI flag or the
/// `INDEX_CONFIG_PATH` environment variable.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_PATH)
}
