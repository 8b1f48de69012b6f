//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_definition("orders", definitions::ORDERS);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::definitions;
    #[allow(unused_imports)]
    pub use super::live_cluster_host;
    #[allow(unused_imports)]
    pub use super::TestFixture;
}

/// Definition file snippets for testing.
#[allow(dead_code)]
pub mod definitions {
    /// A small orders index.
    pub const ORDERS: &str = r#"
mappings:
  properties:
    id:
      type: keyword
    total:
      type: double
settings:
  number_of_shards: 1
  number_of_replicas: 0
"#;

    /// ORDERS with one more field.
    pub const ORDERS_WITH_NOTES: &str = r#"
mappings:
  properties:
    id:
      type: keyword
    total:
      type: double
    notes:
      type: text
settings:
  number_of_shards: 1
  number_of_replicas: 0
"#;

    /// ORDERS with the type of `id` changed.
    pub const ORDERS_NUMERIC_ID: &str = r#"
mappings:
  properties:
    id:
      type: long
    total:
      type: double
settings:
  number_of_shards: 1
  number_of_replicas: 0
"#;

    /// A products index with a keyword subfield.
    pub const PRODUCTS: &str = r#"
mappings:
  properties:
    name:
      type: text
      fields:
        raw:
          type: keyword
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "mappings: [unclosed";
}

/// The cluster used by live tests, taken from `ELASTICSEARCH_HOST`.
#[allow(dead_code)]
pub fn live_cluster_host() -> Option<String> {
    env::var("ELASTICSEARCH_HOST").ok().filter(|h| !h.is_empty())
}

/// A temporary definition directory.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_definition("orders", definitions::ORDERS)
///     .with_file("notes.txt", "ignored");
///
/// fixture.command().arg("validate").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add `<name>.yaml` with the given content.
    pub fn with_definition(self, name: &str, content: &str) -> Self {
        self.with_file(&format!("{}.yaml", name), content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command pointed at this fixture's definitions.
    ///
    /// Store-related environment variables of the calling shell are cleared
    /// so that they cannot leak into the test.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("index-reconciler");
        cmd.current_dir(self.path())
            .env("INDEX_CONFIG_PATH", self.path())
            .env("NO_COLOR", "1")
            .env_remove("INDEX_CONFIG_FORMAT")
            .env_remove("INDEX_PREFIX")
            .env_remove("ELASTICSEARCH_HOST")
            .env_remove("ELASTICSEARCH_USER")
            .env_remove("ELASTICSEARCH_PASSWORD")
            .env_remove("DRY_RUN")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
