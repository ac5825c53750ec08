//! Draft contract codec
//!
//! Serializes a draft model to the reviewable markdown contract and parses
//! reviewed text back, validating the per-section metadata contract. Per fill
//! section the contract is a heading line `## [ID:<section_id>] <title>`, a
//! fenced YAML metadata block with the five required keys (`status`,
//! `checkboxes`, `attachments`, `evidence`, `missing_items`), then the body.
//!
//! Rule: `evidence` or `missing_items` must be non-empty for every section.

use crate::error::{DraftFormatError, DraftFormatErrorKind};
use charter_model::{CheckboxToken, DraftModel, DraftSection, DraftStatus, MissingItem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^##\s+(.+?)\s*$").expect("header regex"));
static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[ID:([A-Za-z0-9_-]+)\]").expect("id regex"));
static YAML_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```yaml\s*\n(.*?)\n```").expect("yaml fence regex"));

const REQUIRED_KEYS: [&str; 5] = [
    "status",
    "checkboxes",
    "attachments",
    "evidence",
    "missing_items",
];

/// Metadata block in contract field order
#[derive(Debug, Serialize)]
struct SectionMetadata<'a> {
    status: DraftStatus,
    checkboxes: &'a [CheckboxToken],
    attachments: &'a [String],
    evidence: &'a [String],
    missing_items: &'a [MissingItem],
}

/// Result of parsing draft text
#[derive(Debug, Clone, Default)]
pub struct DraftParseOutcome {
    /// Sections that could be recovered, in source order
    pub model: DraftModel,
    /// Collected contract violations
    pub errors: Vec<DraftFormatError>,
}

impl DraftParseOutcome {
    /// A draft is usable only when no violation was collected
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Serialize a draft model to the markdown contract
///
/// # Errors
/// Returns the underlying YAML error if metadata serialization fails.
pub fn serialize(model: &DraftModel) -> Result<String, serde_yaml::Error> {
    let mut lines: Vec<String> = Vec::new();
    for section in &model.sections {
        let metadata = SectionMetadata {
            status: section.status,
            checkboxes: &section.checkboxes,
            attachments: &section.attachments,
            evidence: &section.evidence,
            missing_items: &section.missing_items,
        };
        let yaml = serde_yaml::to_string(&metadata)?;
        lines.push(format!("## [ID:{}] {}", section.section_id, section.title));
        lines.push("```yaml".to_string());
        lines.push(yaml.trim_end().to_string());
        lines.push("```".to_string());
        lines.push(String::new());
        lines.push(section.body.trim().to_string());
        lines.push(String::new());
    }
    let mut text = lines.join("\n");
    let trimmed_len = text.trim_end().len();
    text.truncate(trimmed_len);
    text.push('\n');
    Ok(text)
}

/// Parse reviewed draft text, collecting violations per section
#[must_use]
pub fn parse(text: &str) -> DraftParseOutcome {
    let headers: Vec<_> = HEADER_RE.captures_iter(text).collect();
    let mut outcome = DraftParseOutcome::default();

    if headers.is_empty() {
        outcome.errors.push(DraftFormatError::new(
            DraftFormatErrorKind::NoSections,
            "no section headings found; expected '## [ID:<section_id>] <title>'",
        ));
        return outcome;
    }

    for (idx, header) in headers.iter().enumerate() {
        let whole = header.get(0).expect("capture 0 always present");
        let heading_text = header[1].trim().to_string();
        let start = whole.start();
        let end = headers
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let chunk = &text[start..end];

        let Some(id_capture) = ID_RE.captures(&heading_text) else {
            outcome.errors.push(
                DraftFormatError::new(
                    DraftFormatErrorKind::MissingSectionId,
                    format!("heading '{heading_text}' has no [ID:..] token"),
                ),
            );
            continue;
        };
        let section_id = id_capture[1].to_ascii_lowercase();
        let title = ID_RE.replace(&heading_text, "").trim().to_string();

        match parse_section(chunk, &section_id, &title, &mut outcome.errors) {
            Some(section) => outcome.model.sections.push(section),
            None => continue,
        }
    }

    tracing::debug!(
        sections = outcome.model.sections.len(),
        errors = outcome.errors.len(),
        "parsed draft text"
    );
    outcome
}

fn parse_section(
    chunk: &str,
    section_id: &str,
    title: &str,
    errors: &mut Vec<DraftFormatError>,
) -> Option<DraftSection> {
    let Some(yaml_match) = YAML_RE.captures(chunk) else {
        errors.push(
            DraftFormatError::new(
                DraftFormatErrorKind::MissingMetadataBlock,
                format!("section '{section_id}' is missing the required YAML metadata block"),
            )
            .with_section(section_id),
        );
        return None;
    };

    let raw: serde_yaml::Value = match serde_yaml::from_str(&yaml_match[1]) {
        Ok(value) => value,
        Err(error) => {
            errors.push(
                DraftFormatError::new(
                    DraftFormatErrorKind::MetadataNotMapping,
                    format!("section '{section_id}' metadata is not valid YAML: {error}"),
                )
                .with_section(section_id),
            );
            return None;
        }
    };
    if !raw.is_mapping() {
        errors.push(
            DraftFormatError::new(
                DraftFormatErrorKind::MetadataNotMapping,
                format!("section '{section_id}' metadata must be a YAML mapping"),
            )
            .with_section(section_id),
        );
        return None;
    }

    let mut missing_key = false;
    for key in REQUIRED_KEYS {
        if raw.get(key).is_none() {
            missing_key = true;
            errors.push(
                DraftFormatError::new(
                    DraftFormatErrorKind::MissingKey,
                    format!("section '{section_id}' is missing metadata key '{key}'"),
                )
                .with_section(section_id)
                .with_key(key),
            );
        }
    }
    if missing_key {
        return None;
    }

    let before = errors.len();
    let status = parse_status(raw.get("status"), section_id, errors);
    let checkboxes = parse_checkboxes(raw.get("checkboxes"), section_id, errors);
    let attachments = parse_str_list(raw.get("attachments"), section_id, "attachments", errors);
    let evidence = parse_str_list(raw.get("evidence"), section_id, "evidence", errors);
    let missing_items = parse_missing_items(raw.get("missing_items"), section_id, errors);
    if errors.len() > before {
        return None;
    }

    let body_start = yaml_match.get(0).expect("capture 0 always present").end();
    let body = chunk[body_start..].trim().to_string();

    let section = DraftSection {
        section_id: section_id.to_string(),
        title: title.to_string(),
        status: status?,
        checkboxes,
        attachments,
        evidence,
        missing_items,
        body,
    };

    if !section.satisfies_evidence_rule() {
        errors.push(
            DraftFormatError::new(
                DraftFormatErrorKind::EvidenceRuleViolated,
                format!(
                    "section '{section_id}' must include at least one evidence entry or missing item"
                ),
            )
            .with_section(section_id),
        );
    }

    Some(section)
}

fn parse_status(
    value: Option<&serde_yaml::Value>,
    section_id: &str,
    errors: &mut Vec<DraftFormatError>,
) -> Option<DraftStatus> {
    let label = value.and_then(serde_yaml::Value::as_str).unwrap_or_default();
    match DraftStatus::from_label(label) {
        Some(status) => Some(status),
        None => {
            errors.push(
                DraftFormatError::new(
                    DraftFormatErrorKind::InvalidStatus,
                    format!(
                        "section '{section_id}' has invalid status '{label}'; \
                         expected 'complete', 'partial', or 'blocked'"
                    ),
                )
                .with_section(section_id)
                .with_key("status"),
            );
            None
        }
    }
}

fn parse_checkboxes(
    value: Option<&serde_yaml::Value>,
    section_id: &str,
    errors: &mut Vec<DraftFormatError>,
) -> Vec<CheckboxToken> {
    let Some(entries) = value.and_then(serde_yaml::Value::as_sequence) else {
        errors.push(invalid_field(section_id, "checkboxes", "must be a list"));
        return Vec::new();
    };
    let mut checkboxes = Vec::new();
    for entry in entries {
        let name = entry.get("name").and_then(serde_yaml::Value::as_str);
        match name {
            Some(name) => checkboxes.push(CheckboxToken::new(
                name,
                entry
                    .get("checked")
                    .and_then(serde_yaml::Value::as_bool)
                    .unwrap_or(false),
            )),
            None => {
                errors.push(invalid_field(
                    section_id,
                    "checkboxes",
                    "entries must be mappings with key 'name'",
                ));
            }
        }
    }
    checkboxes
}

fn parse_str_list(
    value: Option<&serde_yaml::Value>,
    section_id: &str,
    field: &str,
    errors: &mut Vec<DraftFormatError>,
) -> Vec<String> {
    let Some(entries) = value.and_then(serde_yaml::Value::as_sequence) else {
        errors.push(invalid_field(section_id, field, "must be a list"));
        return Vec::new();
    };
    let mut items = Vec::new();
    for entry in entries {
        match entry.as_str() {
            Some(text) => items.push(text.to_string()),
            None => {
                errors.push(invalid_field(section_id, field, "must be a list of strings"));
            }
        }
    }
    items
}

fn parse_missing_items(
    value: Option<&serde_yaml::Value>,
    section_id: &str,
    errors: &mut Vec<DraftFormatError>,
) -> Vec<MissingItem> {
    let Some(entries) = value.and_then(serde_yaml::Value::as_sequence) else {
        errors.push(invalid_field(section_id, "missing_items", "must be a list"));
        return Vec::new();
    };
    let mut items = Vec::new();
    for entry in entries {
        let id = entry.get("id").and_then(serde_yaml::Value::as_str);
        let question = entry.get("question").and_then(serde_yaml::Value::as_str);
        let (Some(id), Some(question)) = (id, question) else {
            errors.push(invalid_field(
                section_id,
                "missing_items",
                "entries must contain 'id' and 'question'",
            ));
            continue;
        };
        let item_section = entry
            .get("section_id")
            .and_then(serde_yaml::Value::as_str)
            .filter(|text| !text.is_empty())
            .unwrap_or(section_id);
        let mut item = MissingItem::new(id, item_section, question);
        if let Some(response) = entry.get("user_response").and_then(serde_yaml::Value::as_str) {
            item.user_response = response.to_string();
        }
        items.push(item);
    }
    items
}

fn invalid_field(section_id: &str, field: &str, detail: &str) -> DraftFormatError {
    DraftFormatError::new(
        DraftFormatErrorKind::InvalidField,
        format!("section '{section_id}' field '{field}' {detail}"),
    )
    .with_section(section_id)
    .with_key(field)
}
