//! Marker grammar lexer
//!
//! Tolerant, order-independent scan of heading text over the fixed token set
//! `[FILL]`, `[SKIP]`, `[VALIDATOR]`, `[ID:<id>]`. Tokens may appear anywhere
//! in the heading and in any order; defects are collected rather than thrown.

use crate::error::{SchemaError, SchemaErrorKind};
use charter_model::SectionTag;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[(FILL|SKIP|VALIDATOR)\]").expect("tag regex"));
static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[ID:([A-Za-z0-9_-]*)\]").expect("id regex"));
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space regex"));
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug regex"));
static CHECKBOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[CHECK:([A-Za-z0-9_-]+)\]\]").expect("checkbox regex"));

/// Explicit insertion anchor token
pub const SECTION_CONTENT_TOKEN: &str = "[[SECTION_CONTENT]]";

/// Lexed heading: tag, id, cleaned title, plus collected defects
#[derive(Debug, Clone)]
pub(crate) struct HeadingScan {
    pub tag: SectionTag,
    pub id: String,
    pub title: String,
    pub defects: Vec<SchemaError>,
}

/// Tracks assigned ids so slug-derived ids stay unique
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record an explicit id as-is; duplicates are left for validation
    fn claim(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Allocate a unique slug-derived id, suffixing `_2`, `_3`, … on collision
    fn allocate(&mut self, slug: String) -> String {
        if self.used.insert(slug.clone()) {
            return slug;
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{slug}_{suffix}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Lex one heading into (tag, id, title)
///
/// Headings without any tag token become [`SectionTag::Untagged`]; headings
/// without an id token get a slugified-title id, deduplicated against ids
/// already handed out. Returns `None` for headings that are empty after
/// trimming.
pub(crate) fn scan_heading(raw: &str, ids: &mut IdAllocator) -> Option<HeadingScan> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut defects = Vec::new();
    let tag = extract_tag(raw, &mut defects);
    let title = clean_title(raw);
    let id = match extract_id(raw, &mut defects) {
        Some(explicit) => {
            ids.claim(&explicit);
            explicit
        }
        None => ids.allocate(slugify(&title)),
    };

    for defect in &mut defects {
        defect.section_id = Some(id.clone());
        defect.context = Some(raw.to_string());
    }

    Some(HeadingScan {
        tag,
        id,
        title,
        defects,
    })
}

fn extract_tag(text: &str, defects: &mut Vec<SchemaError>) -> SectionTag {
    let mut tag: Option<(SectionTag, String)> = None;
    for capture in TAG_RE.captures_iter(text) {
        let token = capture[1].to_ascii_uppercase();
        let parsed = match token.as_str() {
            "FILL" => SectionTag::Fill,
            "SKIP" => SectionTag::Skip,
            _ => SectionTag::Validator,
        };
        match &tag {
            None => tag = Some((parsed, token)),
            Some((kept, kept_token)) if *kept != parsed => {
                defects.push(SchemaError::new(
                    SchemaErrorKind::ConflictingTags,
                    format!("heading carries both [{kept_token}] and [{token}]; [{kept_token}] wins"),
                ));
            }
            Some(_) => {}
        }
    }
    tag.map_or(SectionTag::Untagged, |(parsed, _)| parsed)
}

fn extract_id(text: &str, defects: &mut Vec<SchemaError>) -> Option<String> {
    let mut id: Option<String> = None;
    for capture in ID_RE.captures_iter(text) {
        let value = capture[1].trim().to_ascii_lowercase();
        if value.is_empty() {
            defects.push(SchemaError::new(
                SchemaErrorKind::EmptyIdToken,
                "id token has an empty payload",
            ));
            continue;
        }
        match &id {
            None => id = Some(value),
            Some(kept) if *kept != value => {
                defects.push(SchemaError::new(
                    SchemaErrorKind::RepeatedIdToken,
                    format!("heading carries ids '{kept}' and '{value}'; '{kept}' wins"),
                ));
            }
            Some(_) => {}
        }
    }
    id
}

fn clean_title(text: &str) -> String {
    let cleaned = BRACKET_RE.replace_all(text, "");
    let cleaned = SPACE_RE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim_matches([' ', '-', ':', '\t']);
    if cleaned.is_empty() {
        "Untitled Section".to_string()
    } else {
        cleaned.to_string()
    }
}

pub(crate) fn slugify(text: &str) -> String {
    let normalized = text.to_lowercase();
    let slug = SLUG_RE.replace_all(&normalized, "_");
    let slug = slug
        .trim_matches('_')
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '_');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Checkbox token names in body text, first occurrence wins
#[must_use]
pub fn checkbox_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for capture in CHECKBOX_RE.captures_iter(text) {
        let name = capture[1].to_string();
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    names
}

/// Whether body text contains marker-like tokens (orphaned marker detection)
#[must_use]
pub fn looks_like_marker(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    ["[FILL]", "[SKIP]", "[VALIDATOR]", "[ID:"]
        .iter()
        .any(|token| upper.contains(token))
}
