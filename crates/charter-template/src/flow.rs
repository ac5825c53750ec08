//! Flow host parser
//!
//! The flowed-document host: a block document of headings, paragraphs, and
//! tables serialized as JSON. Heading blocks open sections; body blocks run
//! to the next heading.

use crate::error::{SchemaError, SchemaErrorKind};
use crate::marker::{checkbox_tokens, scan_heading, IdAllocator, SECTION_CONTENT_TOKEN};
use charter_model::{ContentAnchor, Section, SectionModel, TemplateFormat};
use serde::{Deserialize, Serialize};

/// One block of a flowed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowBlock {
    /// Section heading
    Heading {
        /// Heading level (1-6)
        level: u8,
        /// Heading text, possibly marker-tagged
        text: String,
    },
    /// Plain paragraph
    Paragraph {
        /// Paragraph text
        text: String,
    },
    /// Table of rows and cells
    Table {
        /// Row-major cell text
        rows: Vec<Vec<String>>,
    },
}

impl FlowBlock {
    /// Flatten a block into plain text (rows joined per line)
    #[must_use]
    pub fn text_content(&self) -> String {
        match self {
            Self::Heading { text, .. } | Self::Paragraph { text } => text.clone(),
            Self::Table { rows } => rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(String::as_str)
                        .filter(|cell| !cell.trim().is_empty())
                        .collect::<Vec<_>>()
                        .join(" | ")
                })
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A flowed document: ordered blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDocument {
    /// Blocks in document order
    pub blocks: Vec<FlowBlock>,
}

impl FlowDocument {
    /// Deserialize from the JSON wire form
    ///
    /// # Errors
    /// Returns the underlying serde error for malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize to the JSON wire form (pretty-printed, trailing newline)
    ///
    /// # Errors
    /// Returns the underlying serde error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

/// Block indices of one section in a flow document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSpan {
    /// Index of the heading block
    pub heading_index: usize,
    /// First body block index
    pub body_start: usize,
    /// One past the last body block index
    pub body_end: usize,
}

/// Parsed section plus its block range
#[derive(Debug, Clone)]
pub struct FlowSurveyedSection {
    /// The parsed section
    pub section: Section,
    /// Its block indices in the document
    pub span: FlowSpan,
}

/// Locate and lex every section of a flow document
#[must_use]
pub fn survey_flow(doc: &FlowDocument) -> (Vec<FlowSurveyedSection>, Vec<SchemaError>) {
    let heading_indices: Vec<usize> = doc
        .blocks
        .iter()
        .enumerate()
        .filter_map(|(idx, block)| matches!(block, FlowBlock::Heading { .. }).then_some(idx))
        .collect();

    let mut ids = IdAllocator::new();
    let mut errors = Vec::new();
    let mut surveyed = Vec::new();

    for (ordinal, &heading_index) in heading_indices.iter().enumerate() {
        let FlowBlock::Heading { text, .. } = &doc.blocks[heading_index] else {
            continue;
        };
        let Some(scan) = scan_heading(text, &mut ids) else {
            continue;
        };
        errors.extend(scan.defects);

        let body_start = heading_index + 1;
        let body_end = heading_indices
            .get(ordinal + 1)
            .copied()
            .unwrap_or(doc.blocks.len());
        let body = doc.blocks[body_start..body_end]
            .iter()
            .map(FlowBlock::text_content)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let anchor = if body.contains(SECTION_CONTENT_TOKEN) {
            ContentAnchor::Token
        } else {
            ContentAnchor::FirstBlock
        };

        surveyed.push(FlowSurveyedSection {
            section: Section {
                id: scan.id,
                title: scan.title,
                tag: scan.tag,
                order: heading_index,
                anchor,
                checkbox_tokens: checkbox_tokens(&body),
                body,
                marker_text: text.trim().to_string(),
            },
            span: FlowSpan {
                heading_index,
                body_start,
                body_end,
            },
        });
    }

    (surveyed, errors)
}

/// Parse a JSON flow template into a section model
#[must_use]
pub fn parse_flow(raw: &str) -> (SectionModel, Vec<SchemaError>) {
    let doc = match FlowDocument::from_json(raw) {
        Ok(doc) => doc,
        Err(error) => {
            return (
                SectionModel::new(TemplateFormat::Flow),
                vec![SchemaError::new(
                    SchemaErrorKind::UnreadableDocument,
                    format!("flow document is not valid JSON: {error}"),
                )],
            );
        }
    };

    let (surveyed, errors) = survey_flow(&doc);
    let model = SectionModel {
        format: TemplateFormat::Flow,
        sections: surveyed.into_iter().map(|entry| entry.section).collect(),
    };
    tracing::debug!(
        sections = model.sections.len(),
        errors = errors.len(),
        "parsed flow template"
    );
    (model, errors)
}
