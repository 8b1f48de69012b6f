//! # Report Styling
//!
//! The report colors each alias's action by what it does to the store, and
//! command status lines start with a marker. With colors off, both fall back
//! to plain text so the output stays readable in pipes and CI logs.
//!
//! | Action    | Label color   | Status marker        |
//! |-----------|---------------|----------------------|
//! | `None`    | dim           |                      |
//! | `Create`  | green         | 🆕 / `[NEW]`         |
//! | `Update`  | cyan          | 🔧 / `[UPD]`         |
//! | `Migrate` | yellow        | 🚚 / `[MIG]`         |
//! | `Error`   | bold red      | ❌ / `[ERR]`         |
//!
//! `--color=auto` turns colors off when `NO_COLOR` is set, when `CLICOLOR=0`,
//! or on a `TERM=dumb` terminal, and on when `CLICOLOR_FORCE` is set.
//! Otherwise the terminal decides.

use console::style;
use std::env;

use crate::decision::Action;

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    /// Unrecognized values fall back to `Auto`.
    pub fn from_flag(flag: &str) -> Self {
        match flag.to_ascii_lowercase().as_str() {
            "always" => ColorMode::Always,
            "never" => ColorMode::Never,
            _ => ColorMode::Auto,
        }
    }
}

/// Leading marker of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Scan,
    DryRun,
    Success,
    Failure,
    Created,
    Updated,
    Migrated,
}

impl Marker {
    fn emoji(self) -> &'static str {
        match self {
            Marker::Scan => "🔍",
            Marker::DryRun => "🔎",
            Marker::Success => "✅",
            Marker::Failure => "❌",
            Marker::Created => "🆕",
            Marker::Updated => "🔧",
            Marker::Migrated => "🚚",
        }
    }

    fn plain(self) -> &'static str {
        match self {
            Marker::Scan => "[SCAN]",
            Marker::DryRun => "[DRY]",
            Marker::Success => "[OK]",
            Marker::Failure => "[ERR]",
            Marker::Created => "[NEW]",
            Marker::Updated => "[UPD]",
            Marker::Migrated => "[MIG]",
        }
    }
}

/// Whether report labels and status lines are styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag against the environment and the terminal.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match ColorMode::from_flag(color_flag) {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => auto_color(
                |name| env::var_os(name).map(|v| v.to_string_lossy().into_owned()),
                || console::Term::stdout().features().colors_supported(),
            ),
        };
        Self { use_color }
    }

    /// Unstyled output.
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn marker(&self, marker: Marker) -> &'static str {
        if self.use_color {
            marker.emoji()
        } else {
            marker.plain()
        }
    }

    /// The report label of an action; `None` labels an alias that could not
    /// be compared.
    pub fn action_label(&self, action: Option<Action>) -> String {
        let text = action.map_or_else(|| "Error".to_string(), |a| a.to_string());
        if !self.use_color {
            return text;
        }
        let styled = match action {
            Some(Action::None) => style(text).dim(),
            Some(Action::Create) => style(text).green(),
            Some(Action::Update) => style(text).cyan(),
            Some(Action::Migrate) => style(text).yellow(),
            None => style(text).red().bold(),
        };
        styled.force_styling(true).to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

fn auto_color<V, T>(var: V, terminal_colors: T) -> bool
where
    V: Fn(&str) -> Option<String>,
    T: FnOnce() -> bool,
{
    if var("NO_COLOR").is_some() {
        return false;
    }
    if var("CLICOLOR").as_deref() == Some("0") {
        return false;
    }
    if var("CLICOLOR_FORCE").is_some_and(|v| !v.is_empty() && v != "0") {
        return true;
    }
    if var("TERM").as_deref() == Some("dumb") {
        return false;
    }
    terminal_colors()
}
