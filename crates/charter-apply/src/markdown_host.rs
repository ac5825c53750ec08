//! Markdown host implementation
//!
//! Body edits are byte-range splices against the raw source, applied in
//! reverse order so earlier spans stay valid. Everything outside a fill
//! section's body range is copied verbatim.

use crate::error::UnsafeApplyError;
use crate::host::{resolve_checkbox_tokens, ApplyPlan, TemplateHost};
use charter_model::SectionModel;
use charter_template::{parse_markdown, survey_markdown, SchemaError, SECTION_CONTENT_TOKEN};

const MARKER_OPEN: &str = "<!-- charter:applied";

/// Markdown host: sections are heading-delimited byte ranges
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownHost;

impl TemplateHost for MarkdownHost {
    fn collect(&self, raw: &str) -> (SectionModel, Vec<SchemaError>) {
        parse_markdown(raw)
    }

    fn has_marker(&self, raw: &str) -> bool {
        raw.contains(MARKER_OPEN)
    }

    fn render(&self, raw: &str, plan: &ApplyPlan) -> Result<String, UnsafeApplyError> {
        let (surveyed, _) = survey_markdown(raw);
        let mut replacements: Vec<(usize, usize, String)> = Vec::new();

        for edit in &plan.edits {
            let Some(entry) = surveyed
                .iter()
                .find(|entry| entry.section.id == edit.section_id)
            else {
                tracing::warn!(section_id = %edit.section_id, "edit targets unknown section");
                continue;
            };
            if entry.section.tag.is_protected() {
                return Err(UnsafeApplyError::ProtectedSection {
                    section_id: edit.section_id.clone(),
                });
            }

            let existing = &raw[entry.span.body_start..entry.span.body_end];
            let inserted = if existing.contains(SECTION_CONTENT_TOKEN) {
                existing.replace(SECTION_CONTENT_TOKEN, &edit.body)
            } else if plan.already_applied {
                // Anchor consumed by an earlier apply; leave the body as-is.
                continue;
            } else {
                replace_first_paragraph(existing, &edit.body)
            };
            let resolved = resolve_checkbox_tokens(&inserted, &edit.checkboxes);
            replacements.push((entry.span.body_start, entry.span.body_end, resolved));
        }

        let mut output = raw.to_string();
        replacements.sort_by_key(|(start, _, _)| std::cmp::Reverse(*start));
        for (start, end, text) in replacements {
            output.replace_range(start..end, &text);
        }

        let mut output = strip_marker_lines(&output);
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!("\n<!-- {} -->\n", plan.marker));
        Ok(output)
    }
}

/// Replace the first paragraph of a body range, preserving the remainder
///
/// An all-whitespace range becomes the inserted body on its own paragraph.
fn replace_first_paragraph(existing: &str, insert: &str) -> String {
    match existing.find(|c: char| !c.is_whitespace()) {
        None => format!("\n\n{insert}\n\n"),
        Some(start) => {
            let rest = &existing[start..];
            let end = rest
                .find("\n\n")
                .map_or(start + rest.trim_end().len(), |offset| start + offset);
            format!("{}{}{}", &existing[..start], insert, &existing[end..])
        }
    }
}

fn strip_marker_lines(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim_start().starts_with(MARKER_OPEN))
        .collect();
    let mut out = kept.join("\n");
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_model::{ApplyMarker, ContentDigest};
    use indexmap::IndexMap;

    fn plan(edits: Vec<crate::host::SectionEdit>) -> ApplyPlan {
        ApplyPlan {
            edits,
            marker: ApplyMarker::new(ContentDigest::compute(b"draft")),
            already_applied: false,
        }
    }

    fn edit(section_id: &str, body: &str) -> crate::host::SectionEdit {
        crate::host::SectionEdit {
            section_id: section_id.to_string(),
            body: body.to_string(),
            checkboxes: IndexMap::new(),
        }
    }

    const RAW: &str = "\
## [FILL][ID:a] A

Intro.

[[SECTION_CONTENT]]

Outro.

## [SKIP][ID:b] B

Frozen text.
";

    #[test]
    fn token_substitution_preserves_surroundings() {
        let host = MarkdownHost;
        let output = host.render(RAW, &plan(vec![edit("a", "Generated.")])).unwrap();
        assert!(output.contains("Intro.\n\nGenerated.\n\nOutro."));
        assert!(output.contains("Frozen text."));
        assert!(output.contains(MARKER_OPEN));
    }

    #[test]
    fn fallback_replaces_first_paragraph_only() {
        let raw = "## [FILL][ID:a] A\n\nOld paragraph.\n\nKept tail. [[CHECK:t]]\n";
        let host = MarkdownHost;
        let mut checkboxes = IndexMap::new();
        checkboxes.insert("t".to_string(), true);
        let output = host
            .render(
                raw,
                &plan(vec![crate::host::SectionEdit {
                    section_id: "a".to_string(),
                    body: "New paragraph.".to_string(),
                    checkboxes,
                }]),
            )
            .unwrap();
        assert!(output.contains("New paragraph.\n\nKept tail."));
        assert!(!output.contains("Old paragraph."));
        assert!(output.contains(crate::host::CHECKED_GLYPH));
    }

    #[test]
    fn protected_target_refused() {
        let host = MarkdownHost;
        let result = host.render(RAW, &plan(vec![edit("b", "Sneaky.")]));
        assert!(matches!(
            result,
            Err(UnsafeApplyError::ProtectedSection { section_id }) if section_id == "b"
        ));
    }

    #[test]
    fn stale_markers_are_replaced() {
        let host = MarkdownHost;
        let first = host.render(RAW, &plan(vec![edit("a", "Once.")])).unwrap();
        assert!(host.has_marker(&first));
        let second = host.render(&first, &plan(vec![edit("a", "Twice.")])).unwrap();
        assert_eq!(second.matches(MARKER_OPEN).count(), 1);
    }

    #[test]
    fn empty_body_gets_inserted_paragraph() {
        let raw = "## [FILL][ID:a] A\n\n## [SKIP][ID:b] B\n\nFrozen.\n";
        let host = MarkdownHost;
        let output = host.render(raw, &plan(vec![edit("a", "Filled.")])).unwrap();
        let filled = output.find("Filled.").unwrap();
        let skip_heading = output.find("[SKIP]").unwrap();
        assert!(filled < skip_heading);
        assert!(output.contains("Frozen."));
    }
}
