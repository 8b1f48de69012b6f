//! Decision scenarios using datatest-stable for test data discovery
//!
//! Every YAML file under `tests/testdata/decisions` describes one comparison:
//!
//! ```yaml
//! allow_soft_update: true        # optional, defaults to true
//! current:                       # optional, absent means the alias does not exist
//!   mappings: {...}
//!   settings: {...}
//! desired:
//!   mappings: {...}
//! expected:
//!   action: Update               # or `error: <substring>` for comparison errors
//!   changes:
//!     - "CREATE => mappings.properties.tags"
//! ```

use index_reconciler::decision::decide;
use index_reconciler::definition::IndexDefinition;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default = "soft_update_default")]
    allow_soft_update: bool,
    current: Option<IndexDefinition>,
    desired: IndexDefinition,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    action: Option<String>,
    #[serde(default)]
    changes: Vec<String>,
    error: Option<String>,
}

fn soft_update_default() -> bool {
    true
}

/// Run one decision scenario file.
fn test_decision_scenario(path: &Path) -> datatest_stable::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read scenario {}: {}", path.display(), e))?;
    let scenario: Scenario = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse scenario {}: {}", path.display(), e))?;

    let result = decide(
        scenario.current.as_ref(),
        &scenario.desired,
        scenario.allow_soft_update,
    );

    match (&scenario.expected.error, result) {
        (Some(expected), Err(e)) => {
            assert!(
                e.to_string().contains(expected.as_str()),
                "{}: error '{}' does not mention '{}'",
                path.display(),
                e,
                expected
            );
        }
        (Some(expected), Ok(decision)) => {
            return Err(format!(
                "{}: expected an error mentioning '{}', got {}",
                path.display(),
                expected,
                decision.action
            )
            .into());
        }
        (None, Err(e)) => {
            return Err(format!("{}: unexpected error: {}", path.display(), e).into());
        }
        (None, Ok(decision)) => {
            let expected_action = scenario
                .expected
                .action
                .as_deref()
                .ok_or_else(|| format!("{}: expected.action is missing", path.display()))?;
            assert_eq!(
                decision.action.to_string(),
                expected_action,
                "{}: wrong action",
                path.display()
            );

            let changes: Vec<String> = decision.changes.iter().map(ToString::to_string).collect();
            assert_eq!(
                changes,
                scenario.expected.changes,
                "{}: wrong changes",
                path.display()
            );
        }
    }
    Ok(())
}

datatest_stable::harness!(
    test_decision_scenario,
    "tests/testdata/decisions",
    r".*\.yaml$"
);
