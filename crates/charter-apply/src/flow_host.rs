//! Flow host implementation
//!
//! Edits mutate paragraph/cell text inside fill-section block ranges; every
//! block outside those ranges is copied unchanged. The marker is a trailing
//! paragraph block.

use crate::error::UnsafeApplyError;
use crate::host::{resolve_checkbox_tokens, ApplyPlan, TemplateHost};
use charter_model::{SectionModel, MARKER_PREFIX};
use charter_template::{
    parse_flow, survey_flow, FlowBlock, FlowDocument, SchemaError, SchemaErrorKind,
    SECTION_CONTENT_TOKEN,
};

/// Flow host: sections are heading-delimited block ranges
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowHost;

impl TemplateHost for FlowHost {
    fn collect(&self, raw: &str) -> (SectionModel, Vec<SchemaError>) {
        parse_flow(raw)
    }

    fn has_marker(&self, raw: &str) -> bool {
        FlowDocument::from_json(raw).is_ok_and(|doc| {
            doc.blocks.iter().any(|block| is_marker_block(block))
        })
    }

    fn render(&self, raw: &str, plan: &ApplyPlan) -> Result<String, UnsafeApplyError> {
        let doc = FlowDocument::from_json(raw).map_err(|error| {
            UnsafeApplyError::TemplateInvalid {
                errors: vec![SchemaError::new(
                    SchemaErrorKind::UnreadableDocument,
                    format!("flow document is not valid JSON: {error}"),
                )],
            }
        })?;
        let (surveyed, _) = survey_flow(&doc);
        let mut blocks = doc.blocks;

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

            let range = entry.span.body_start..entry.span.body_end;
            let has_token = blocks[range.clone()]
                .iter()
                .any(|block| block.text_content().contains(SECTION_CONTENT_TOKEN));
            if !has_token && plan.already_applied {
                // Anchor consumed by an earlier apply; leave the body as-is.
                continue;
            }
            insert_body(&mut blocks[range.clone()], edit)?;
            for block in &mut blocks[range] {
                resolve_block_checkboxes(block, edit);
            }
        }

        blocks.retain(|block| !is_marker_block(block));
        blocks.push(FlowBlock::Paragraph {
            text: format!("[{}]", plan.marker),
        });

        FlowDocument { blocks }
            .to_json()
            .map_err(|error| UnsafeApplyError::TemplateInvalid {
                errors: vec![SchemaError::new(
                    SchemaErrorKind::UnreadableDocument,
                    format!("flow document could not be serialized: {error}"),
                )],
            })
    }
}

/// Place the edit body at the section anchor
///
/// Preference order: the block holding `[[SECTION_CONTENT]]`, then the first
/// paragraph, then the first table cell. A section with none of these is
/// unwritable.
fn insert_body(
    body_blocks: &mut [FlowBlock],
    edit: &crate::host::SectionEdit,
) -> Result<(), UnsafeApplyError> {
    for block in body_blocks.iter_mut() {
        match block {
            FlowBlock::Paragraph { text } if text.contains(SECTION_CONTENT_TOKEN) => {
                *text = text.replace(SECTION_CONTENT_TOKEN, &edit.body);
                return Ok(());
            }
            FlowBlock::Table { rows } => {
                for row in rows.iter_mut() {
                    for cell in row.iter_mut() {
                        if cell.contains(SECTION_CONTENT_TOKEN) {
                            *cell = cell.replace(SECTION_CONTENT_TOKEN, &edit.body);
                            return Ok(());
                        }
                    }
                }
            }
            FlowBlock::Paragraph { .. } | FlowBlock::Heading { .. } => {}
        }
    }

    for block in body_blocks.iter_mut() {
        if let FlowBlock::Paragraph { text } = block {
            *text = edit.body.clone();
            return Ok(());
        }
    }
    for block in body_blocks.iter_mut() {
        if let FlowBlock::Table { rows } = block {
            if let Some(cell) = rows.iter_mut().flatten().next() {
                *cell = edit.body.clone();
                return Ok(());
            }
        }
    }

    Err(UnsafeApplyError::NoWritableBody {
        section_id: edit.section_id.clone(),
    })
}

fn resolve_block_checkboxes(block: &mut FlowBlock, edit: &crate::host::SectionEdit) {
    match block {
        FlowBlock::Paragraph { text } => {
            *text = resolve_checkbox_tokens(text, &edit.checkboxes);
        }
        FlowBlock::Table { rows } => {
            for cell in rows.iter_mut().flatten() {
                *cell = resolve_checkbox_tokens(cell, &edit.checkboxes);
            }
        }
        FlowBlock::Heading { .. } => {}
    }
}

fn is_marker_block(block: &FlowBlock) -> bool {
    matches!(
        block,
        FlowBlock::Paragraph { text } if text.trim_start().starts_with(&format!("[{MARKER_PREFIX}"))
    )
}
