//! Ledger file format, merge, and atomic persistence
//!
//! File format, one block per entry:
//!
//! ```text
//! ## <missing_item_id>
//! section_id: <section_id>
//! question: <text>
//! user_response: <text or empty>
//! ```

use crate::error::ContextError;
use charter_model::MissingItem;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^##\s+(.+?)\s*$").expect("heading regex"));

/// Load the ledger from disk; a missing file is an empty ledger
///
/// # Errors
/// Returns [`ContextError::Io`] if the file exists but cannot be read.
pub fn load(path: &Path) -> Result<Vec<MissingItem>, ContextError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path).map_err(|error| ContextError::io(path, error))?;
    Ok(parse_text(&text))
}

/// Parse ledger text; blocks lacking `section_id` or `question` are skipped
#[must_use]
pub fn parse_text(text: &str) -> Vec<MissingItem> {
    let headings: Vec<_> = HEADING_RE.captures_iter(text).collect();
    let mut items = Vec::new();

    for (idx, heading) in headings.iter().enumerate() {
        let whole = heading.get(0).expect("group 0");
        let start = whole.end();
        let end = headings
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let fields = parse_block_fields(&text[start..end]);

        let section_id = fields.get("section_id").map_or("", |value| value.trim());
        let question = fields.get("question").map_or("", |value| value.trim());
        if section_id.is_empty() || question.is_empty() {
            continue;
        }

        let mut item = MissingItem::new(heading[1].trim(), section_id, question);
        if let Some(response) = fields.get("user_response") {
            item.user_response = response.trim().to_string();
        }
        items.push(item);
    }

    items
}

/// Merge newly discovered missing items into the existing ledger
///
/// Match key is `(section_id, question)`: an unchanged question keeps the
/// existing entry verbatim (preserving any `user_response`); a changed
/// question for the same section is a new entry, and the old one is retained.
/// Output is grouped by section in `section_order`, sections no longer in the
/// template after that (lexically), insertion order within each group.
#[must_use]
pub fn merge(
    existing: &[MissingItem],
    discovered: &[MissingItem],
    section_order: &[String],
) -> Vec<MissingItem> {
    let mut merged: Vec<MissingItem> = existing.to_vec();
    let mut seen: HashSet<(String, String)> = existing
        .iter()
        .map(|item| (item.section_id.clone(), item.question.clone()))
        .collect();

    for item in discovered {
        let key = (item.section_id.clone(), item.question.clone());
        if seen.insert(key) {
            merged.push(item.clone());
        }
    }

    let rank: HashMap<&str, usize> = section_order
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();
    merged.sort_by(|a, b| group_key(a, &rank).cmp(&group_key(b, &rank)));

    tracing::debug!(
        existing = existing.len(),
        discovered = discovered.len(),
        merged = merged.len(),
        "merged context ledger"
    );
    merged
}

fn group_key<'a>(item: &'a MissingItem, rank: &HashMap<&str, usize>) -> (usize, &'a str) {
    match rank.get(item.section_id.as_str()) {
        Some(position) => (*position, ""),
        None => (usize::MAX, item.section_id.as_str()),
    }
}

/// Render the ledger to its file format
#[must_use]
pub fn render(items: &[MissingItem]) -> String {
    let mut lines = Vec::new();
    for item in items {
        lines.push(format!("## {}", item.id));
        lines.push(format!("section_id: {}", item.section_id));
        lines.push(format!("question: {}", item.question));
        lines.push(format!("user_response: {}", item.user_response));
        lines.push(String::new());
    }
    let mut text = lines.join("\n");
    let trimmed_len = text.trim_end().len();
    text.truncate(trimmed_len);
    text.push('\n');
    text
}

/// Write the ledger atomically (temp file, then a single rename)
///
/// # Errors
/// Returns [`ContextError::Io`] on any filesystem failure; a failed write
/// never leaves a partial context file behind.
pub fn write(items: &[MissingItem], path: &Path) -> Result<(), ContextError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|error| ContextError::io(parent, error))?;
        }
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = Path::new(&temp);
    std::fs::write(temp, render(items)).map_err(|error| ContextError::io(temp, error))?;
    std::fs::rename(temp, path).map_err(|error| ContextError::io(path, error))?;
    tracing::info!(path = %path.display(), entries = items.len(), "wrote context ledger");
    Ok(())
}

/// Answered responses grouped by section, for feeding back into generation
///
/// Unanswered entries are excluded; each section's responses are rendered as
/// `- <id>: <response>` lines in ledger order.
#[must_use]
pub fn responses_by_section(items: &[MissingItem]) -> IndexMap<String, String> {
    let mut by_section: IndexMap<String, Vec<String>> = IndexMap::new();
    for item in items {
        if !item.is_answered() {
            continue;
        }
        by_section
            .entry(item.section_id.clone())
            .or_default()
            .push(format!("- {}: {}", item.id, item.user_response.trim()));
    }
    by_section
        .into_iter()
        .map(|(section, lines)| (section, lines.join("\n")))
        .collect()
}

fn parse_block_fields(block: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in block.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: &str, section: &str, question: &str, response: &str) -> MissingItem {
        let mut item = MissingItem::new(id, section, question);
        item.user_response = response.to_string();
        item
    }

    #[test]
    fn render_and_parse_round_trip() {
        let items = vec![
            item("owner", "exec_summary", "Who owns the model?", ""),
            item("cadence", "monitoring_plan", "Review cadence?", "Quarterly"),
        ];
        let parsed = parse_text(&render(&items));
        assert_eq!(parsed, items);
    }

    #[test]
    fn write_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contexts").join("additional-context.md");
        let items = vec![item("owner", "exec_summary", "Who owns the model?", "Alice")];
        write(&items, &path).unwrap();
        assert_eq!(load(&path).unwrap(), items);
        assert!(!path.with_extension("md.tmp").exists());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.md")).unwrap().is_empty());
    }

    #[test]
    fn parse_skips_incomplete_blocks() {
        let text = "## half\nsection_id: a\n\n## whole\nsection_id: a\nquestion: Q\nuser_response:\n";
        let parsed = parse_text(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "whole");
    }

    #[test]
    fn merge_preserves_answers_for_unchanged_questions() {
        let existing = vec![item("owner", "exec_summary", "Who owns the model?", "Alice")];
        let discovered = vec![item("owner_2", "exec_summary", "Who owns the model?", "")];
        let merged = merge(&existing, &discovered, &["exec_summary".to_string()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "owner");
        assert_eq!(merged[0].user_response, "Alice");
    }

    #[test]
    fn merge_keeps_old_entry_when_question_changes() {
        let existing = vec![item("owner", "exec_summary", "Who owns the model?", "Alice")];
        let discovered = vec![item("owner", "exec_summary", "Who is accountable?", "")];
        let merged = merge(&existing, &discovered, &["exec_summary".to_string()]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].user_response, "Alice");
        assert_eq!(merged[1].question, "Who is accountable?");
    }

    #[test]
    fn merge_orders_by_template_then_lexically() {
        let existing = vec![
            item("z1", "retired_section", "Old question?", "kept"),
            item("b1", "b_section", "Q-b?", ""),
        ];
        let discovered = vec![
            item("a1", "a_section", "Q-a?", ""),
            item("y1", "another_retired", "Gone?", ""),
        ];
        let order = vec!["a_section".to_string(), "b_section".to_string()];
        let merged = merge(&existing, &discovered, &order);
        let sections: Vec<_> = merged.iter().map(|entry| entry.section_id.as_str()).collect();
        assert_eq!(
            sections,
            vec!["a_section", "b_section", "another_retired", "retired_section"]
        );
    }

    #[test]
    fn responses_exclude_unanswered() {
        let items = vec![
            item("m1", "s1", "Q1", "Answer one"),
            item("m2", "s1", "Q2", ""),
            item("m3", "s2", "Q3", "  "),
        ];
        let lookup = responses_by_section(&items);
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup["s1"], "- m1: Answer one");
    }
}
