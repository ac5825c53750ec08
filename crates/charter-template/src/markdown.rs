//! Markdown host parser
//!
//! Uses pulldown-cmark offset iteration to locate ATX headings; each heading
//! opens a section whose body runs to the next heading or end of input.

use crate::error::SchemaError;
use crate::marker::{checkbox_tokens, scan_heading, IdAllocator, SECTION_CONTENT_TOKEN};
use charter_model::{ContentAnchor, Section, SectionModel, TemplateFormat};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::ops::Range;

/// Byte offsets of one section in the raw markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    /// Start of the heading line
    pub heading_start: usize,
    /// End of the heading line
    pub heading_end: usize,
    /// Start of the body range
    pub body_start: usize,
    /// End of the body range (next heading or end of input)
    pub body_end: usize,
}

/// Parsed section plus its location in the source
#[derive(Debug, Clone)]
pub struct SurveyedSection {
    /// The parsed section
    pub section: Section,
    /// Its byte offsets in the raw template
    pub span: SectionSpan,
}

/// Locate and lex every section of a markdown template
#[must_use]
pub fn survey_markdown(raw: &str) -> (Vec<SurveyedSection>, Vec<SchemaError>) {
    let headings = collect_headings(raw);
    let mut ids = IdAllocator::new();
    let mut errors = Vec::new();
    let mut surveyed = Vec::new();

    for (idx, (range, text)) in headings.iter().enumerate() {
        let Some(scan) = scan_heading(text, &mut ids) else {
            continue;
        };
        errors.extend(scan.defects);

        let body_start = range.end;
        let body_end = headings
            .get(idx + 1)
            .map_or(raw.len(), |(next, _)| next.start);
        let body = raw[body_start..body_end].trim().to_string();
        let anchor = if body.contains(SECTION_CONTENT_TOKEN) {
            ContentAnchor::Token
        } else {
            ContentAnchor::FirstBlock
        };

        surveyed.push(SurveyedSection {
            section: Section {
                id: scan.id,
                title: scan.title,
                tag: scan.tag,
                order: idx,
                anchor,
                checkbox_tokens: checkbox_tokens(&body),
                body,
                marker_text: text.trim().to_string(),
            },
            span: SectionSpan {
                heading_start: range.start,
                heading_end: range.end,
                body_start,
                body_end,
            },
        });
    }

    (surveyed, errors)
}

/// Parse a markdown template into a section model
#[must_use]
pub fn parse_markdown(raw: &str) -> (SectionModel, Vec<SchemaError>) {
    let (surveyed, errors) = survey_markdown(raw);
    let model = SectionModel {
        format: TemplateFormat::Markdown,
        sections: surveyed.into_iter().map(|entry| entry.section).collect(),
    };
    tracing::debug!(
        sections = model.sections.len(),
        errors = errors.len(),
        "parsed markdown template"
    );
    (model, errors)
}

fn collect_headings(raw: &str) -> Vec<(Range<usize>, String)> {
    let mut headings = Vec::new();
    let mut current: Option<(Range<usize>, String)> = None;

    for (event, range) in Parser::new(raw).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                current = Some((range, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}
