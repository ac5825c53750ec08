//! Draft section model
//!
//! The generated/reviewed counterpart of the template sections. A draft
//! section may never be silently fabricated: for every fill-eligible section,
//! `evidence` or `missing_items` must be non-empty.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Completion state of a generated section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// All required information was found
    Complete,
    /// Content generated, but open questions remain
    Partial,
    /// Generation exhausted its retry budget; missing items only
    Blocked,
}

impl DraftStatus {
    /// Parse the contract's lowercase status string
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "complete" => Some(Self::Complete),
            "partial" => Some(Self::Partial),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Lowercase label used by the draft contract
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Named checkbox declaration carried by a draft section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxToken {
    /// Token name matching a `[[CHECK:<name>]]` placeholder
    pub name: String,
    /// Resolved state
    #[serde(default)]
    pub checked: bool,
}

impl CheckboxToken {
    /// Create a checkbox token
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            checked,
        }
    }
}

/// Durable question/answer pair
///
/// Created when a draft section records an unresolved question; the
/// `user_response` is filled in externally by a human editing the context
/// file and preserved verbatim across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingItem {
    /// Identifier unique within the ledger
    pub id: String,
    /// Template section the question belongs to
    pub section_id: String,
    /// The unresolved question
    pub question: String,
    /// Human-supplied answer; empty until answered
    #[serde(default)]
    pub user_response: String,
}

impl MissingItem {
    /// Create an unanswered missing item
    #[inline]
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        section_id: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            section_id: section_id.into(),
            question: question.into(),
            user_response: String::new(),
        }
    }

    /// Whether a human has supplied an answer
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.user_response.trim().is_empty()
    }
}

/// Generated/reviewed content for one template section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSection {
    /// Matching template section id
    pub section_id: String,
    /// Display title
    pub title: String,
    /// Completion state
    pub status: DraftStatus,
    /// Ordered checkbox declarations
    pub checkboxes: Vec<CheckboxToken>,
    /// Referenced evidence artifacts (relative paths)
    pub attachments: Vec<String>,
    /// Evidence citations backing the narrative
    pub evidence: Vec<String>,
    /// Unresolved questions
    pub missing_items: Vec<MissingItem>,
    /// Narrative text
    pub body: String,
}

impl DraftSection {
    /// Evidence rule: `evidence` or `missing_items` must be non-empty
    #[must_use]
    pub fn satisfies_evidence_rule(&self) -> bool {
        !self.evidence.is_empty() || !self.missing_items.is_empty()
    }

    /// Checkbox name → state lookup preserving declaration order
    #[must_use]
    pub fn checkbox_map(&self) -> IndexMap<&str, bool> {
        self.checkboxes
            .iter()
            .map(|token| (token.name.as_str(), token.checked))
            .collect()
    }
}

/// Ordered collection of draft sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftModel {
    /// Sections in template order
    pub sections: Vec<DraftSection>,
}

impl DraftModel {
    /// Create an empty draft model
    #[inline]
    #[must_use]
    pub fn new(sections: Vec<DraftSection>) -> Self {
        Self { sections }
    }

    /// Look up a draft section by template section id
    #[must_use]
    pub fn section(&self, section_id: &str) -> Option<&DraftSection> {
        self.sections
            .iter()
            .find(|section| section.section_id == section_id)
    }

    /// All missing items across sections, in section order
    #[must_use]
    pub fn missing_items(&self) -> Vec<MissingItem> {
        self.sections
            .iter()
            .flat_map(|section| section.missing_items.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_section(id: &str) -> DraftSection {
        DraftSection {
            section_id: id.to_string(),
            title: id.to_string(),
            status: DraftStatus::Complete,
            checkboxes: vec![
                CheckboxToken::new("kpi_defined", true),
                CheckboxToken::new("owner_named", false),
            ],
            attachments: Vec::new(),
            evidence: vec!["README.md:1".to_string()],
            missing_items: Vec::new(),
            body: "Body.".to_string(),
        }
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [DraftStatus::Complete, DraftStatus::Partial, DraftStatus::Blocked] {
            assert_eq!(DraftStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(DraftStatus::from_label("done"), None);
    }

    #[test]
    fn evidence_rule() {
        let mut section = draft_section("a");
        assert!(section.satisfies_evidence_rule());

        section.evidence.clear();
        assert!(!section.satisfies_evidence_rule());

        section
            .missing_items
            .push(MissingItem::new("m1", "a", "What is the owner?"));
        assert!(section.satisfies_evidence_rule());
    }

    #[test]
    fn checkbox_map_preserves_order() {
        let section = draft_section("a");
        let map = section.checkbox_map();
        let names: Vec<_> = map.keys().copied().collect();
        assert_eq!(names, vec!["kpi_defined", "owner_named"]);
        assert_eq!(map.get("kpi_defined"), Some(&true));
        assert_eq!(map.get("owner_named"), Some(&false));
    }

    #[test]
    fn missing_item_answered() {
        let mut item = MissingItem::new("m1", "a", "Q");
        assert!(!item.is_answered());
        item.user_response = "  ".to_string();
        assert!(!item.is_answered());
        item.user_response = "Alice".to_string();
        assert!(item.is_answered());
    }

    #[test]
    fn model_lookup_and_missing_items() {
        let mut blocked = draft_section("b");
        blocked.evidence.clear();
        blocked.status = DraftStatus::Blocked;
        blocked
            .missing_items
            .push(MissingItem::new("m1", "b", "Need scope details."));

        let model = DraftModel::new(vec![draft_section("a"), blocked]);
        assert!(model.section("a").is_some());
        assert!(model.section("z").is_none());
        let items = model.missing_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].section_id, "b");
    }
}
