//! External generation capability
//!
//! The content producer is an external collaborator: given a section, an
//! evidence bundle, and merged context responses, it returns a draft section
//! or a structured failure. The core never depends on provider identity —
//! the capability is injected, which keeps orchestration deterministic under
//! test doubles.

use async_trait::async_trait;
use charter_model::{DraftSection, Section};
use serde::{Deserialize, Serialize};

/// One citation-bearing piece of codebase-derived evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Source location, e.g. `src/train.py:42`
    pub source: String,
    /// Extracted detail the generator may cite
    pub detail: String,
}

impl EvidenceRef {
    /// Create an evidence reference
    #[inline]
    #[must_use]
    pub fn new(source: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            detail: detail.into(),
        }
    }
}

/// Evidence handed to the generator; extraction itself is out of scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Evidence references in extraction order
    pub refs: Vec<EvidenceRef>,
}

impl EvidenceBundle {
    /// Create a bundle from references
    #[inline]
    #[must_use]
    pub fn new(refs: Vec<EvidenceRef>) -> Self {
        Self { refs }
    }
}

/// Inputs for one section's generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// The template section to fill
    pub section: &'a Section,
    /// Evidence available to the generator
    pub evidence: &'a EvidenceBundle,
    /// Human-supplied context responses for this section, possibly empty
    pub context: &'a str,
}

/// Structured failure modes of the generation capability
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    /// The provider did not answer in time
    #[error("generation timed out")]
    Timeout,

    /// The provider reported an error
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider answered with something that is not a draft section
    #[error("malformed output: {0}")]
    MalformedOutput(String),
}

/// The external content producer, injected into the orchestrator
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Generate one draft section
    ///
    /// # Errors
    /// Returns a [`GenerationFailure`]; the orchestrator retries within its
    /// policy bounds and degrades to missing items on exhaustion.
    async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<DraftSection, GenerationFailure>;
}
