//! Draft contract format errors
//!
//! Collected per section so one parse yields complete diagnostics; the
//! overall result is invalid if any error exists.

use serde::{Deserialize, Serialize};

/// Classification of a draft contract violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftFormatErrorKind {
    /// No `## [ID:..]` section headings found at all
    NoSections,
    /// Section heading without an `[ID:..]` token
    MissingSectionId,
    /// Section without the required fenced YAML metadata block
    MissingMetadataBlock,
    /// Metadata block is not a YAML mapping
    MetadataNotMapping,
    /// A required metadata key is absent
    MissingKey,
    /// Unknown `status` value
    InvalidStatus,
    /// A metadata field has the wrong shape
    InvalidField,
    /// Both `evidence` and `missing_items` are empty
    EvidenceRuleViolated,
}

impl std::fmt::Display for DraftFormatErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NoSections => "no sections",
            Self::MissingSectionId => "missing section id",
            Self::MissingMetadataBlock => "missing metadata block",
            Self::MetadataNotMapping => "metadata not a mapping",
            Self::MissingKey => "missing metadata key",
            Self::InvalidStatus => "invalid status",
            Self::InvalidField => "invalid metadata field",
            Self::EvidenceRuleViolated => "evidence rule violated",
        };
        write!(f, "{label}")
    }
}

/// One collected draft contract violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DraftFormatError {
    /// Violation classification
    pub kind: DraftFormatErrorKind,
    /// Section the violation belongs to, when known
    pub section_id: Option<String>,
    /// Offending metadata key, when applicable
    pub key: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl DraftFormatError {
    /// Create an error with a message
    #[inline]
    #[must_use]
    pub fn new(kind: DraftFormatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            section_id: None,
            key: None,
            message: message.into(),
        }
    }

    /// Attach the owning section id
    #[inline]
    #[must_use]
    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Attach the offending metadata key
    #[inline]
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}
