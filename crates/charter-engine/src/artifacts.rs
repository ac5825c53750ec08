//! Run artifact writing
//!
//! One directory per run: the reviewable draft, a machine-readable summary,
//! the open questions, the attachment manifest, and the trace. All writes
//! share the temp-file-then-rename discipline of the apply engine.

use crate::error::EngineError;
use crate::trace::RunTrace;
use charter_model::{DraftModel, DraftStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Machine-readable run summary
#[derive(Debug, Serialize)]
struct DraftSummary {
    generated_at: DateTime<Utc>,
    section_count: usize,
    unresolved_sections: Vec<String>,
}

/// One attachment manifest row
#[derive(Debug, Serialize)]
struct AttachmentRow<'a> {
    section_id: &'a str,
    attachment: &'a str,
}

/// Write the run artifacts for a generated draft
///
/// Emits `draft.md`, `draft-summary.json`, `missing-items.json`,
/// `attachments-manifest.json`, and `trace.json` under `dir`.
///
/// # Errors
/// Returns [`EngineError`] on serialization or filesystem failure; a failed
/// write never leaves a partial artifact behind.
pub fn write_run_artifacts(
    dir: &Path,
    draft: &DraftModel,
    trace: &RunTrace,
) -> Result<(), EngineError> {
    std::fs::create_dir_all(dir).map_err(|error| EngineError::io(dir, error))?;

    write_atomic(&dir.join("draft.md"), &charter_draft::serialize(draft)?)?;

    let summary = DraftSummary {
        generated_at: Utc::now(),
        section_count: draft.sections.len(),
        unresolved_sections: draft
            .sections
            .iter()
            .filter(|section| section.status != DraftStatus::Complete)
            .map(|section| section.section_id.clone())
            .collect(),
    };
    write_atomic(&dir.join("draft-summary.json"), &to_json(&summary)?)?;

    write_atomic(
        &dir.join("missing-items.json"),
        &to_json(&draft.missing_items())?,
    )?;

    let attachments: Vec<AttachmentRow<'_>> = draft
        .sections
        .iter()
        .flat_map(|section| {
            section.attachments.iter().map(|attachment| AttachmentRow {
                section_id: &section.section_id,
                attachment,
            })
        })
        .collect();
    write_atomic(&dir.join("attachments-manifest.json"), &to_json(&attachments)?)?;

    write_atomic(&dir.join("trace.json"), &trace.to_json()?)?;

    tracing::info!(dir = %dir.display(), sections = draft.sections.len(), "wrote run artifacts");
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, EngineError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), EngineError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = Path::new(&temp);
    std::fs::write(temp, contents).map_err(|error| EngineError::io(temp, error))?;
    std::fs::rename(temp, path).map_err(|error| EngineError::io(path, error))?;
    Ok(())
}
