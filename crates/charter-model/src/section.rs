//! Template section model
//!
//! A parsed template is an ordered list of uniquely-identified sections, each
//! carrying its marker tag, insertion anchor, and checkbox tokens. The tag of
//! a section never changes after parsing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Supported template host formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFormat {
    /// Plain markdown with ATX headings
    Markdown,
    /// Flowed block document (headings, paragraphs, tables) serialized as JSON
    Flow,
}

impl TemplateFormat {
    /// Detect format from a template file path extension
    ///
    /// `.md`/`.markdown` map to [`TemplateFormat::Markdown`], `.json` to
    /// [`TemplateFormat::Flow`]. Returns `None` for anything else.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "json" => Some(Self::Flow),
            _ => None,
        }
    }
}

impl std::fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Flow => write!(f, "flow"),
        }
    }
}

impl Default for TemplateFormat {
    fn default() -> Self {
        Self::Markdown
    }
}

/// Marker tag of a template section
///
/// Closed set: every downstream site matches exhaustively. `Untagged` has
/// fill semantics but retains provenance so reporting can distinguish an
/// explicit `[FILL]` from an implicit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    /// Requires generated/reviewed narrative content
    Fill,
    /// Frozen; excluded from generation and apply
    Skip,
    /// Frozen; reserved for out-of-band human sign-off
    Validator,
    /// Heading without a marker; treated with fill semantics
    Untagged,
}

impl SectionTag {
    /// Whether this section is eligible for generation and apply insertion
    #[inline]
    #[must_use]
    pub const fn is_fill_eligible(self) -> bool {
        matches!(self, Self::Fill | Self::Untagged)
    }

    /// Whether this section must never be written by the apply engine
    #[inline]
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Skip | Self::Validator)
    }
}

impl std::fmt::Display for SectionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fill => write!(f, "FILL"),
            Self::Skip => write!(f, "SKIP"),
            Self::Validator => write!(f, "VALIDATOR"),
            Self::Untagged => write!(f, "UNTAGGED"),
        }
    }
}

/// Where generated body text is inserted within a section
///
/// Decided at parse time: an explicit `[[SECTION_CONTENT]]` placeholder wins;
/// otherwise the first eligible paragraph/cell in the body range is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAnchor {
    /// Explicit `[[SECTION_CONTENT]]` placeholder present in the body
    Token,
    /// Fallback: first eligible block in the section body range
    FirstBlock,
}

/// One addressable unit of the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique, non-empty identifier, stable across runs
    pub id: String,
    /// Display title with marker tokens stripped
    pub title: String,
    /// Marker tag; never changes after parsing
    pub tag: SectionTag,
    /// Source document order, strictly increasing
    pub order: usize,
    /// Insertion point for generated body text
    pub anchor: ContentAnchor,
    /// Ordered, deduplicated checkbox token names found in the body
    pub checkbox_tokens: Vec<String>,
    /// Raw body text of the section range
    pub body: String,
    /// Original heading text, kept for error context
    pub marker_text: String,
}

/// Ordered collection of parsed template sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionModel {
    /// Host format the model was parsed from
    pub format: TemplateFormat,
    /// Sections in source order
    pub sections: Vec<Section>,
}

impl SectionModel {
    /// Create an empty model for the given format
    #[inline]
    #[must_use]
    pub fn new(format: TemplateFormat) -> Self {
        Self {
            format,
            sections: Vec::new(),
        }
    }

    /// Look up a section by id
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// Iterate fill-eligible sections in source order
    pub fn fill_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|section| section.tag.is_fill_eligible())
    }

    /// Section ids in source order
    #[must_use]
    pub fn section_order(&self) -> Vec<String> {
        self.sections
            .iter()
            .map(|section| section.id.clone())
            .collect()
    }

    /// Whether any fill-eligible section exists
    #[must_use]
    pub fn has_fill_sections(&self) -> bool {
        self.fill_sections().next().is_some()
    }

    /// Ids that appear more than once, in first-occurrence order
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for section in &self.sections {
            if !seen.insert(section.id.as_str()) && reported.insert(section.id.as_str()) {
                duplicates.push(section.id.clone());
            }
        }
        duplicates
    }

    /// Whether `order` values strictly increase in source order
    #[must_use]
    pub fn is_strictly_ordered(&self) -> bool {
        self.sections
            .windows(2)
            .all(|pair| pair[0].order < pair[1].order)
    }
}
