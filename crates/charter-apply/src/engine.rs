//! Merge/apply engine
//!
//! Re-parses the template (never trusting a caller-supplied model), checks
//! the apply marker, plans one insertion per fill section, and writes a new
//! document copy atomically. Skip/validator sections are copied unchanged —
//! draft content addressed to them is dropped on the floor by design, and
//! the host insert primitive independently refuses protected targets.

use crate::error::UnsafeApplyError;
use crate::flow_host::FlowHost;
use crate::host::{ApplyPlan, SectionEdit, TemplateHost};
use crate::markdown_host::MarkdownHost;
use charter_model::{
    AppliedDocument, ApplyMarker, ContentDigest, DraftModel, DraftSection, DraftStatus,
    TemplateFormat,
};
use charter_template::validate;
use indexmap::IndexMap;
use std::path::Path;

/// Apply behavior switches
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Override an existing apply marker
    pub force: bool,
    /// Context file name referenced by unresolved-section notes
    pub context_reference: String,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            force: false,
            context_reference: "additional-context.md".to_string(),
        }
    }
}

/// The host capability for a template format
#[must_use]
pub fn host_for(format: TemplateFormat) -> Box<dyn TemplateHost> {
    match format {
        TemplateFormat::Markdown => Box::new(MarkdownHost),
        TemplateFormat::Flow => Box::new(FlowHost),
    }
}

/// Apply a validated draft onto a copy of the template
///
/// The whole operation is atomic: the output document is rendered in memory,
/// written to a sibling temp file, then finalized with a single rename. Any
/// failure leaves the filesystem unchanged.
///
/// # Errors
/// Returns [`UnsafeApplyError`] — see the variants for the refusal taxonomy.
/// Apply is total: every fill-eligible template section must have a matching
/// draft section.
pub fn apply(
    template_path: &Path,
    draft: &DraftModel,
    out_path: &Path,
    options: &ApplyOptions,
) -> Result<AppliedDocument, UnsafeApplyError> {
    let format = TemplateFormat::from_path(template_path).ok_or_else(|| {
        UnsafeApplyError::UnsupportedTemplate {
            path: template_path.to_path_buf(),
        }
    })?;
    if out_path == template_path {
        return Err(UnsafeApplyError::OutputIsInput {
            path: out_path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(template_path)
        .map_err(|error| UnsafeApplyError::io(template_path, error))?;
    let host = host_for(format);

    let output = render_applied(host.as_ref(), &raw, draft, options)?;

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|error| UnsafeApplyError::io(parent, error))?;
        }
    }
    let mut temp = out_path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = Path::new(&temp);
    std::fs::write(temp, &output.text).map_err(|error| UnsafeApplyError::io(temp, error))?;
    std::fs::rename(temp, out_path).map_err(|error| UnsafeApplyError::io(out_path, error))?;

    tracing::info!(
        output = %out_path.display(),
        digest = %output.marker.digest.short(),
        unresolved = output.unresolved_section_ids.len(),
        "applied draft to template copy"
    );
    Ok(AppliedDocument {
        output_path: out_path.to_path_buf(),
        marker: output.marker,
        unresolved_section_ids: output.unresolved_section_ids,
    })
}

struct RenderedApply {
    text: String,
    marker: ApplyMarker,
    unresolved_section_ids: Vec<String>,
}

fn render_applied(
    host: &dyn TemplateHost,
    raw: &str,
    draft: &DraftModel,
    options: &ApplyOptions,
) -> Result<RenderedApply, UnsafeApplyError> {
    let (model, mut errors) = host.collect(raw);
    errors.extend(validate(&model));
    if !errors.is_empty() {
        return Err(UnsafeApplyError::TemplateInvalid { errors });
    }

    let already_applied = host.has_marker(raw);
    if already_applied && !options.force {
        return Err(UnsafeApplyError::AlreadyApplied);
    }

    let mut edits = Vec::new();
    let mut unresolved_section_ids = Vec::new();
    for section in &model.sections {
        if section.tag.is_protected() {
            if draft.section(&section.id).is_some() {
                tracing::warn!(
                    section_id = %section.id,
                    tag = %section.tag,
                    "draft supplies content for a protected section; dropping it"
                );
            }
            continue;
        }

        let Some(draft_section) = draft.section(&section.id) else {
            return Err(UnsafeApplyError::MissingDraftSection {
                section_id: section.id.clone(),
            });
        };
        if draft_section.status != DraftStatus::Complete {
            unresolved_section_ids.push(section.id.clone());
        }
        edits.push(SectionEdit {
            section_id: section.id.clone(),
            body: insert_text(draft_section, &options.context_reference),
            checkboxes: owned_checkbox_map(draft_section),
        });
    }

    let digest = ContentDigest::compute_serializable(draft)?;
    let marker = ApplyMarker::new(digest);
    let plan = ApplyPlan {
        edits,
        marker: marker.clone(),
        already_applied,
    };
    let text = host.render(raw, &plan)?;

    Ok(RenderedApply {
        text,
        marker,
        unresolved_section_ids,
    })
}

/// Rendered insert text: trimmed draft body, plus an unresolved note for
/// sections still carrying open questions
fn insert_text(section: &DraftSection, context_reference: &str) -> String {
    let mut text = section.body.trim().to_string();
    if section.status != DraftStatus::Complete {
        text.push_str(&format!(
            "\n\nUNRESOLVED: This section includes missing information. \
             Review {context_reference} and update."
        ));
    }
    text
}

fn owned_checkbox_map(section: &DraftSection) -> IndexMap<String, bool> {
    section
        .checkboxes
        .iter()
        .map(|token| (token.name.clone(), token.checked))
        .collect()
}
