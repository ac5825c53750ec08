//! Template parsing for Charter
//!
//! Turns a raw marker-annotated template into a [`SectionModel`], collecting
//! structured [`SchemaError`]s instead of throwing. Two host formats share
//! one marker grammar and one section model:
//! - markdown (ATX headings) via pulldown-cmark
//! - flowed block documents (headings/paragraphs/tables) serialized as JSON
//!
//! Marker grammar, per heading and order-independent:
//! `[FILL][ID:x] Title` | `[ID:x][FILL] Title` | `Title [FILL]` (slug id) |
//! untagged heading (implicit fill semantics) | `[SKIP]`/`[VALIDATOR]`
//! variants of the same shapes.

mod error;
mod flow;
mod markdown;
mod marker;
mod validate;

pub use error::{SchemaError, SchemaErrorKind};
pub use flow::{
    parse_flow, survey_flow, FlowBlock, FlowDocument, FlowSpan, FlowSurveyedSection,
};
pub use markdown::{parse_markdown, survey_markdown, SectionSpan, SurveyedSection};
pub use marker::{checkbox_tokens, looks_like_marker, SECTION_CONTENT_TOKEN};
pub use validate::validate;

use charter_model::{SectionModel, TemplateFormat};

/// Parse a raw template in the given host format
///
/// Never fails: malformed markers and unreadable documents are reported in
/// the returned error list. Callers map a non-empty list (after
/// [`validate`]) to the schema-invalid exit status.
#[must_use]
pub fn parse(raw: &str, format: TemplateFormat) -> (SectionModel, Vec<SchemaError>) {
    match format {
        TemplateFormat::Markdown => parse_markdown(raw),
        TemplateFormat::Flow => parse_flow(raw),
    }
}
