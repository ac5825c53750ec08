//! Template schema validation
//!
//! Second-pass checks over a parsed section model. Errors are collected so a
//! single validation run yields complete diagnostics.

use crate::error::{SchemaError, SchemaErrorKind};
use crate::marker::looks_like_marker;
use charter_model::SectionModel;

/// Validate a parsed section model
///
/// Checks: non-empty model, unique section ids (a fill id colliding with a
/// protected id is reported with both tags named), at least one fill-eligible
/// section, no marker-like text orphaned inside section bodies.
#[must_use]
pub fn validate(model: &SectionModel) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if model.sections.is_empty() {
        errors.push(SchemaError::new(
            SchemaErrorKind::EmptyTemplate,
            "no template sections found",
        ));
        return errors;
    }

    for id in model.duplicate_ids() {
        let tags: Vec<String> = model
            .sections
            .iter()
            .filter(|section| section.id == id)
            .map(|section| section.tag.to_string())
            .collect();
        errors.push(
            SchemaError::new(
                SchemaErrorKind::DuplicateSectionId,
                format!(
                    "section id '{id}' is used by {} sections ({})",
                    tags.len(),
                    tags.join(", ")
                ),
            )
            .with_section(id),
        );
    }

    if !model.has_fill_sections() {
        errors.push(SchemaError::new(
            SchemaErrorKind::NoFillSections,
            "template must contain at least one fillable section",
        ));
    }

    for section in &model.sections {
        if looks_like_marker(&section.body) {
            errors.push(
                SchemaError::new(
                    SchemaErrorKind::OrphanedMarker,
                    format!(
                        "section '{}' body contains marker-like text outside a heading",
                        section.id
                    ),
                )
                .with_section(section.id.clone())
                .with_context(section.marker_text.clone()),
            );
        }
    }

    errors
}
