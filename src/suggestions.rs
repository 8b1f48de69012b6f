//! # Error Suggestions
//!
//! Helper functions that turn common user mistakes into errors carrying
//! hints. Errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use index_reconciler::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Definition directory not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::definitions_not_found(path));
//! ```

use std::path::Path;

use crate::error::Error;
use crate::plan::AliasFailure;

/// Generate an error for when the definition directory does not exist.
///
/// Includes hints about the `--path` flag and its environment variable.
pub fn definitions_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Definition directory not found: {path}\n\n\
         hint: Create the directory and add one <name>.yaml file per index\n\
         hint: Use --path to point at a different directory\n\
         hint: Set the INDEX_CONFIG_PATH environment variable",
        path = path.display()
    )
}

/// Generate an error for a definition directory without any definition.
pub fn no_definitions(path: &Path, format: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "No {format} definitions found under {path}\n\n\
         hint: Definition files are matched by extension (use --format to switch between yaml and json)",
        path = path.display()
    )
}

/// Generate an error for `--index-names` entries that match no definition.
///
/// Suggests the closest known definition name when there is one.
pub fn unknown_index_name(name: &str, available: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, available)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Cannot find configuration for index '{name}'{did_you_mean}\n\n\
         Available definitions: {names}",
        names = if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        }
    )
}

/// Generate an error for an unsupported definition format.
pub fn unknown_format(format: &str, supported: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(format, supported)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unsupported definition format: {format}{did_you_mean}\n\n\
         Supported formats are: {formats}",
        formats = supported.join(", ")
    )
}

/// Generate an error for an invalid `--filter` glob pattern.
///
/// Includes hints about glob syntax.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * to match any part of a definition name (e.g., 'logs-*')\n\
         hint: Use [abc] for character classes, [!abc] to negate"
    )
}

/// Generate an error for a store host that cannot be used.
pub fn invalid_host(host: &str, error: &Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot use store host '{host}'\n\
         error: {error}\n\n\
         hint: Include the scheme and port, e.g. http://localhost:9200\n\
         hint: Set the ELASTICSEARCH_HOST environment variable"
    )
}

/// Generate an error for a run where some aliases could not be compared.
///
/// The shape-conflict hint is only added when one of the failures is a
/// comparison error.
pub fn comparison_failed(failures: &[AliasFailure]) -> anyhow::Error {
    let shape_hint = if failures.iter().any(|f| f.error.is_comparison()) {
        "\nhint: A shape conflict (scalar vs. object) usually means a field was declared as a bare type"
    } else {
        ""
    };

    anyhow::anyhow!(
        "{failed} alias(es) could not be compared; nothing was applied\n\n\
         hint: Fix the definitions listed as 'Error' above, or exclude them with --index-names{shape_hint}",
        failed = failures.len()
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, a_char) in a_chars.iter().enumerate() {
        let mut current = vec![i + 1; b_chars.len() + 1];
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }
    previous[b_chars.len()]
}
