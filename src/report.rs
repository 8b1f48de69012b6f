//! Human-readable rendering of a [`Plan`].
//!
//! ```text
//! Index 'orders' => Create
//! Index 'products' => Migrate
//!     UPDATE => mappings.properties.id.type [From: integer - To: keyword]
//! Summary: 1 to create, 0 to update, 1 to migrate, 0 unchanged, 0 failed
//! ```
//!
//! Aliases that could not be compared are listed in place with the action
//! `Error` and the error message as their only detail line.

use crate::decision::Action;
use crate::output::OutputConfig;
use crate::plan::{AliasFailure, Plan, ReconciliationTask};

const DETAIL_INDENT: &str = "    ";

enum Entry<'a> {
    Task(&'a ReconciliationTask),
    Failure(&'a AliasFailure),
}

/// Render the plan without any styling.
pub fn render(plan: &Plan) -> String {
    render_styled(plan, &OutputConfig::plain())
}

/// Render the plan, coloring action labels when the output allows it.
pub fn render_styled(plan: &Plan, output: &OutputConfig) -> String {
    let mut entries: Vec<(&str, Entry<'_>)> = plan
        .tasks
        .iter()
        .map(|task| (task.alias.as_str(), Entry::Task(task)))
        .chain(
            plan.failures
                .iter()
                .map(|failure| (failure.alias.as_str(), Entry::Failure(failure))),
        )
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut lines = Vec::new();
    for (alias, entry) in entries {
        match entry {
            Entry::Task(task) => {
                let action = task.action();
                lines.push(format!(
                    "Index '{}' => {}",
                    alias,
                    output.action_label(Some(action))
                ));
                for change in &task.decision.changes {
                    lines.push(format!("{}{}", DETAIL_INDENT, change));
                }
            }
            Entry::Failure(failure) => {
                lines.push(format!("Index '{}' => {}", alias, output.action_label(None)));
                lines.push(format!("{}{}", DETAIL_INDENT, failure.error));
            }
        }
    }
    lines.push(summary(plan));
    lines.join("\n")
}

/// One-line count of actions and failures.
pub fn summary(plan: &Plan) -> String {
    format!(
        "Summary: {} to create, {} to update, {} to migrate, {} unchanged, {} failed",
        plan.count(Action::Create),
        plan.count(Action::Update),
        plan.count(Action::Migrate),
        plan.count(Action::None),
        plan.failures.len()
    )
}
