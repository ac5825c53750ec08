//! Abstract section-location/anchor capability
//!
//! One trait, two hosts: the merge engine stays host-agnostic and depends
//! only on `collect` (locate sections), `has_marker`, and `render` (insert
//! into fill sections, copy everything else unchanged, stamp the marker).

use crate::error::UnsafeApplyError;
use charter_model::{ApplyMarker, SectionModel};
use charter_template::SchemaError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Glyph rendered for a checked checkbox token
pub const CHECKED_GLYPH: &str = "\u{2612}";
/// Glyph rendered for an unchecked or unresolved checkbox token
pub const UNCHECKED_GLYPH: &str = "\u{2610}";

static CHECKBOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[CHECK:([A-Za-z0-9_-]+)\]\]").expect("checkbox regex"));

/// One planned insertion into a fill section
#[derive(Debug, Clone)]
pub struct SectionEdit {
    /// Target template section id
    pub section_id: String,
    /// Fully rendered body text to insert
    pub body: String,
    /// Checkbox name → state, resolved against tokens in the section
    pub checkboxes: IndexMap<String, bool>,
}

/// Everything a host needs to render the output document
#[derive(Debug, Clone)]
pub struct ApplyPlan {
    /// Insertions in template section order
    pub edits: Vec<SectionEdit>,
    /// Marker stamped into the output
    pub marker: ApplyMarker,
    /// The input already carries a marker (forced re-apply). Sections whose
    /// anchor token is gone were consumed by the earlier pass and are left
    /// unchanged, which keeps a repeated apply byte-stable modulo the marker.
    pub already_applied: bool,
}

/// Host capability: locate sections, detect markers, render the output copy
pub trait TemplateHost {
    /// Re-parse the raw template into the authoritative section model
    fn collect(&self, raw: &str) -> (SectionModel, Vec<SchemaError>);

    /// Whether an apply marker is already embedded
    fn has_marker(&self, raw: &str) -> bool;

    /// Render the output document: insert each edit at its section anchor,
    /// copy protected sections unchanged, strip stale markers, stamp the new
    /// one
    ///
    /// # Errors
    /// Returns [`UnsafeApplyError`] if an edit targets a protected section or
    /// a section with no writable body block.
    fn render(&self, raw: &str, plan: &ApplyPlan) -> Result<String, UnsafeApplyError>;
}

/// Resolve `[[CHECK:<name>]]` tokens to glyphs
///
/// Names absent from the map render the unset glyph; names present only in
/// the map are no-ops.
#[must_use]
pub fn resolve_checkbox_tokens(text: &str, checkboxes: &IndexMap<String, bool>) -> String {
    CHECKBOX_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            if checkboxes.get(&caps[1]).copied().unwrap_or(false) {
                CHECKED_GLYPH
            } else {
                UNCHECKED_GLYPH
            }
        })
        .into_owned()
}
