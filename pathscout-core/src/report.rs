// Rendering of scan results for the terminal or for other tools

use colored::Colorize;
use pathscout_scanner::{EndpointCandidateMatch, LabelMatches};
use std::collections::{BTreeMap, BTreeSet};

/// Which part of each match is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// The literal itself, delimiters included.
    #[default]
    Value,
    /// The surrounding construct.
    Context,
}

impl DisplayMode {
    pub fn from_show_context(show_context: bool) -> Self {
        if show_context {
            DisplayMode::Context
        } else {
            DisplayMode::Value
        }
    }

    fn select<'a>(&self, m: &'a EndpointCandidateMatch) -> &'a str {
        match self {
            DisplayMode::Value => &m.value,
            DisplayMode::Context => &m.context,
        }
    }
}

/// Non-empty entries keyed by label, so output order does not depend on the
/// order in which responses arrived.
fn sorted_sections<'a>(
    entries: &'a [LabelMatches],
    mode: DisplayMode,
) -> BTreeMap<&'a str, Vec<&'a str>> {
    entries
        .iter()
        .filter(|entry| !entry.matches.is_empty())
        .map(|entry| {
            let lines = entry.matches.iter().map(|m| mode.select(m)).collect();
            (entry.label.as_str(), lines)
        })
        .collect()
}

/// A JSON object mapping each label to its matches.
pub fn render_json(entries: &[LabelMatches], mode: DisplayMode) -> Result<String, serde_json::Error> {
    serde_json::to_string(&sorted_sections(entries, mode))
}

/// Every distinct match across all labels, sorted, without its label.
fn unique_candidates(entries: &[LabelMatches], mode: DisplayMode) -> BTreeSet<&str> {
    entries
        .iter()
        .flat_map(|entry| entry.matches.iter().map(|m| mode.select(m)))
        .collect()
}

/// A JSON array of the distinct matches across all labels. Empty when nothing
/// matched.
pub fn render_all_json(entries: &[LabelMatches], mode: DisplayMode) -> Result<String, serde_json::Error> {
    let candidates = unique_candidates(entries, mode);
    if candidates.is_empty() {
        return Ok(String::new());
    }
    serde_json::to_string(&candidates)
}

/// The distinct matches across all labels, one per line.
pub fn render_all_text(entries: &[LabelMatches], mode: DisplayMode) -> String {
    unique_candidates(entries, mode)
        .into_iter()
        .collect::<Vec<_>>()
        .join("\n")
}

/// One section per label: the label, an underline of `=`, then one match per
/// line. Sections are separated by a blank line.
pub fn render_text(entries: &[LabelMatches], mode: DisplayMode, color: bool) -> String {
    sorted_sections(entries, mode)
        .into_iter()
        .map(|(label, lines)| {
            let underline = "=".repeat(label.chars().count());
            let header = if color {
                format!("{}\n{}", label.bold(), underline.dimmed())
            } else {
                format!("{}\n{}", label, underline)
            };
            format!("{}\n{}", header, lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
