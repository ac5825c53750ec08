//! Structured template schema errors
//!
//! Malformed markers and structural problems are collected, never thrown, so
//! one validation pass yields complete diagnostics. Every error carries
//! enough context (section id, heading text) to be actionable without
//! re-reading the source.

use serde::{Deserialize, Serialize};

/// Classification of a template schema problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaErrorKind {
    /// The raw template could not be read as its host format
    UnreadableDocument,
    /// Marker tokens present but not parseable into a tag/id pair
    MalformedMarker,
    /// More than one distinct tag token on a single heading
    ConflictingTags,
    /// More than one `[ID:..]` token with differing values
    RepeatedIdToken,
    /// `[ID:..]` token with an empty or invalid payload
    EmptyIdToken,
    /// Two sections share the same id
    DuplicateSectionId,
    /// The template contains no sections at all
    EmptyTemplate,
    /// The template contains no fill-eligible section
    NoFillSections,
    /// Marker-like text found outside a heading
    OrphanedMarker,
}

impl std::fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::UnreadableDocument => "unreadable document",
            Self::MalformedMarker => "malformed marker",
            Self::ConflictingTags => "conflicting tags",
            Self::RepeatedIdToken => "repeated id token",
            Self::EmptyIdToken => "empty id token",
            Self::DuplicateSectionId => "duplicate section id",
            Self::EmptyTemplate => "empty template",
            Self::NoFillSections => "no fill sections",
            Self::OrphanedMarker => "orphaned marker",
        };
        write!(f, "{label}")
    }
}

/// One collected template schema problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SchemaError {
    /// Problem classification
    pub kind: SchemaErrorKind,
    /// Section the problem belongs to, when known
    pub section_id: Option<String>,
    /// Offending heading or marker text, when known
    pub context: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl SchemaError {
    /// Create an error with a message
    #[inline]
    #[must_use]
    pub fn new(kind: SchemaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            section_id: None,
            context: None,
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

    /// Attach the offending heading or marker text
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
