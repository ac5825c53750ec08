//! Generation orchestrator
//!
//! Strictly sequential, in template section order — repeatable runs are a
//! design requirement, so no section's generation depends on another
//! concurrently. The only suspension point is the per-section call into the
//! external capability, bounded by a configurable attempt count and a
//! per-attempt timeout. Exhaustion is an explicit terminal state that
//! degrades the section to missing items; content is never fabricated.

use crate::capability::{EvidenceBundle, GenerationCapability, GenerationRequest};
use crate::trace::{RunTrace, TraceEvent};
use charter_model::{
    DraftModel, DraftSection, DraftStatus, MissingItem, Section, SectionModel,
};
use std::time::{Duration, Instant};

/// Bounded retry/timeout policy for capability calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per section before degrading to missing items
    pub max_attempts: u32,
    /// Per-attempt timeout
    pub attempt_timeout: Duration,
    /// Linear backoff base: attempt `n` sleeps `n * backoff_base`
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(90),
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Typed outcome of one capability attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The capability returned a draft section
    Success,
    /// The capability failed; the orchestrator may retry
    RecoverableFailure(String),
    /// The attempt hit the per-attempt timeout
    TimedOut,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::RecoverableFailure(detail) => write!(f, "recoverable failure: {detail}"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Sequences per-section generation through the injected capability
#[derive(Debug, Clone, Copy, Default)]
pub struct Orchestrator {
    policy: RetryPolicy,
}

impl Orchestrator {
    /// Create an orchestrator with the given policy
    #[inline]
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The active policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate a draft for every fill-eligible section, in template order
    ///
    /// Context ledger entries with answered responses are routed to their
    /// sections; each attempt is recorded to `trace`.
    pub async fn generate_draft(
        &self,
        model: &SectionModel,
        evidence: &EvidenceBundle,
        context: &[MissingItem],
        capability: &dyn GenerationCapability,
        trace: &mut RunTrace,
    ) -> DraftModel {
        let responses = charter_context::responses_by_section(context);
        let fill: Vec<&Section> = model.fill_sections().collect();
        tracing::info!(sections = fill.len(), "drafting fill sections");

        let mut sections = Vec::with_capacity(fill.len());
        for (idx, section) in fill.iter().enumerate() {
            tracing::info!(
                section_id = %section.id,
                index = idx + 1,
                total = fill.len(),
                "drafting section"
            );
            let context_text = responses
                .get(&section.id)
                .map_or("", String::as_str);
            let draft = self
                .generate_section(section, evidence, context_text, capability, trace)
                .await;
            trace.record(
                TraceEvent::new("orchestrator", "section_done")
                    .with_section(&section.id)
                    .with_details(format!(
                        "status={} evidence={} missing={}",
                        draft.status,
                        draft.evidence.len(),
                        draft.missing_items.len()
                    )),
            );
            sections.push(draft);
        }

        DraftModel::new(sections)
    }

    async fn generate_section(
        &self,
        section: &Section,
        evidence: &EvidenceBundle,
        context: &str,
        capability: &dyn GenerationCapability,
        trace: &mut RunTrace,
    ) -> DraftSection {
        for attempt in 1..=self.policy.max_attempts {
            let request = GenerationRequest {
                section,
                evidence,
                context,
            };
            let started = Instant::now();
            let result = tokio::time::timeout(
                self.policy.attempt_timeout,
                capability.generate(request),
            )
            .await;
            let duration = started.elapsed();

            let outcome = match result {
                Ok(Ok(draft)) => {
                    trace.record(
                        TraceEvent::new("orchestrator", "generate_attempt")
                            .with_section(&section.id)
                            .with_attempt(attempt)
                            .with_duration(duration)
                            .with_details(AttemptOutcome::Success.to_string()),
                    );
                    return normalize_section(section, draft);
                }
                Ok(Err(failure)) => AttemptOutcome::RecoverableFailure(failure.to_string()),
                Err(_) => AttemptOutcome::TimedOut,
            };

            tracing::warn!(
                section_id = %section.id,
                attempt,
                max_attempts = self.policy.max_attempts,
                outcome = %outcome,
                "generation attempt failed"
            );
            trace.record(
                TraceEvent::new("orchestrator", "generate_attempt")
                    .with_section(&section.id)
                    .with_attempt(attempt)
                    .with_duration(duration)
                    .with_details(outcome.to_string())
                    .failed(),
            );

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.backoff_base * attempt).await;
            }
        }

        trace.record(
            TraceEvent::new("orchestrator", "generate_exhausted")
                .with_section(&section.id)
                .with_attempt(self.policy.max_attempts)
                .failed(),
        );
        blocked_section(section, self.policy.max_attempts)
    }
}

/// Align capability output with the template section and repair evidence-rule
/// violations by recording an explicit gap — never by inventing evidence
fn normalize_section(section: &Section, mut draft: DraftSection) -> DraftSection {
    draft.section_id = section.id.clone();
    draft.title = section.title.clone();

    if !draft.satisfies_evidence_rule() {
        draft.missing_items.push(MissingItem::new(
            format!("{}_missing_info", section.id),
            &section.id,
            "Required information was not found in the provided evidence.",
        ));
    }
    if !draft.missing_items.is_empty() && draft.status == DraftStatus::Complete {
        draft.status = DraftStatus::Partial;
    }
    draft
}

/// Terminal degradation after retry exhaustion: missing items only
fn blocked_section(section: &Section, attempts: u32) -> DraftSection {
    DraftSection {
        section_id: section.id.clone(),
        title: section.title.clone(),
        status: DraftStatus::Blocked,
        checkboxes: Vec::new(),
        attachments: Vec::new(),
        evidence: Vec::new(),
        missing_items: vec![MissingItem::new(
            format!("{}_generation_failed", section.id),
            &section.id,
            format!(
                "Content generation failed after {attempts} attempts; \
                 supply this section's facts manually."
            ),
        )],
        body: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_model::{ContentAnchor, SectionTag};

    fn section(id: &str) -> Section {
        Section {
            id: id.to_string(),
            title: format!("Title {id}"),
            tag: SectionTag::Fill,
            order: 0,
            anchor: ContentAnchor::Token,
            checkbox_tokens: Vec::new(),
            body: String::new(),
            marker_text: String::new(),
        }
    }

    fn capability_output(status: DraftStatus) -> DraftSection {
        DraftSection {
            section_id: "stale_id".to_string(),
            title: "Stale".to_string(),
            status,
            checkboxes: Vec::new(),
            attachments: Vec::new(),
            evidence: vec!["src/lib.rs:1".to_string()],
            missing_items: Vec::new(),
            body: "Body.".to_string(),
        }
    }

    #[test]
    fn normalize_aligns_identity_with_template() {
        let normalized = normalize_section(&section("a"), capability_output(DraftStatus::Complete));
        assert_eq!(normalized.section_id, "a");
        assert_eq!(normalized.title, "Title a");
        assert_eq!(normalized.status, DraftStatus::Complete);
    }

    #[test]
    fn normalize_repairs_evidence_rule() {
        let mut output = capability_output(DraftStatus::Complete);
        output.evidence.clear();
        let normalized = normalize_section(&section("a"), output);
        assert_eq!(normalized.missing_items.len(), 1);
        assert_eq!(normalized.missing_items[0].id, "a_missing_info");
        assert_eq!(normalized.status, DraftStatus::Partial);
    }

    #[test]
    fn blocked_section_is_missing_items_only() {
        let blocked = blocked_section(&section("a"), 3);
        assert_eq!(blocked.status, DraftStatus::Blocked);
        assert!(blocked.body.is_empty());
        assert!(blocked.evidence.is_empty());
        assert!(blocked.satisfies_evidence_rule());
        assert!(blocked.missing_items[0].question.contains("3 attempts"));
    }
}
