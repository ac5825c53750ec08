//! Orchestrator behavior under deterministic capability doubles.

use async_trait::async_trait;
use charter_engine::{
    EvidenceBundle, GenerationCapability, GenerationFailure, GenerationRequest, Orchestrator,
    RetryPolicy, RunTrace, TraceStatus,
};
use charter_model::{
    ContentAnchor, DraftSection, DraftStatus, MissingItem, Section, SectionModel, SectionTag,
    TemplateFormat,
};
use std::sync::Mutex;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn fill_section(id: &str, order: usize) -> Section {
    Section {
        id: id.to_string(),
        title: format!("Title {id}"),
        tag: SectionTag::Fill,
        order,
        anchor: ContentAnchor::Token,
        checkbox_tokens: Vec::new(),
        body: String::new(),
        marker_text: String::new(),
    }
}

fn model(ids: &[&str]) -> SectionModel {
    SectionModel {
        format: TemplateFormat::Markdown,
        sections: ids
            .iter()
            .enumerate()
            .map(|(order, id)| fill_section(id, order))
            .collect(),
    }
}

fn generated(section_id: &str) -> DraftSection {
    DraftSection {
        section_id: section_id.to_string(),
        title: section_id.to_string(),
        status: DraftStatus::Complete,
        checkboxes: Vec::new(),
        attachments: Vec::new(),
        evidence: vec!["src/lib.rs:1".to_string()],
        missing_items: Vec::new(),
        body: format!("Generated body for {section_id}."),
    }
}

/// One scripted behavior per call, in order; repeats the last step when
/// exhausted.
enum Step {
    Succeed,
    Fail(GenerationFailure),
    Hang,
}

struct Scripted {
    steps: Mutex<Vec<Step>>,
    calls: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn contexts_seen(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationCapability for Scripted {
    async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<DraftSection, GenerationFailure> {
        self.calls
            .lock()
            .unwrap()
            .push(request.context.to_string());
        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.remove(0)
            } else if let Some(last) = steps.first() {
                match last {
                    Step::Succeed => Step::Succeed,
                    Step::Fail(failure) => Step::Fail(failure.clone()),
                    Step::Hang => Step::Hang,
                }
            } else {
                Step::Succeed
            }
        };
        match step {
            Step::Succeed => Ok(generated(&request.section.id)),
            Step::Fail(failure) => Err(failure),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(GenerationFailure::Timeout)
            }
        }
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        attempt_timeout: Duration::from_millis(50),
        backoff_base: Duration::ZERO,
    }
}

#[tokio::test]
async fn first_attempt_success() {
    init_tracing();
    let capability = Scripted::new(vec![Step::Succeed]);
    let orchestrator = Orchestrator::new(fast_policy());
    let mut trace = RunTrace::new();

    let draft = orchestrator
        .generate_draft(
            &model(&["a"]),
            &EvidenceBundle::default(),
            &[],
            &capability,
            &mut trace,
        )
        .await;

    assert_eq!(draft.sections.len(), 1);
    assert_eq!(draft.sections[0].status, DraftStatus::Complete);
    let attempts = trace
        .events()
        .iter()
        .filter(|event| event.action == "generate_attempt")
        .count();
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn recoverable_failure_then_success() {
    init_tracing();
    let capability = Scripted::new(vec![
        Step::Fail(GenerationFailure::Provider("rate limited".to_string())),
        Step::Succeed,
    ]);
    let orchestrator = Orchestrator::new(fast_policy());
    let mut trace = RunTrace::new();

    let draft = orchestrator
        .generate_draft(
            &model(&["a"]),
            &EvidenceBundle::default(),
            &[],
            &capability,
            &mut trace,
        )
        .await;

    assert_eq!(draft.sections[0].status, DraftStatus::Complete);
    let attempts: Vec<_> = trace
        .events()
        .iter()
        .filter(|event| event.action == "generate_attempt")
        .collect();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].status, TraceStatus::Error);
    assert!(attempts[0]
        .details
        .as_deref()
        .unwrap()
        .contains("rate limited"));
    assert_eq!(attempts[1].status, TraceStatus::Ok);
}

#[tokio::test]
async fn timeout_exhaustion_degrades_to_blocked() {
    init_tracing();
    let capability = Scripted::new(vec![Step::Hang]);
    let orchestrator = Orchestrator::new(fast_policy());
    let mut trace = RunTrace::new();

    let draft = orchestrator
        .generate_draft(
            &model(&["a"]),
            &EvidenceBundle::default(),
            &[],
            &capability,
            &mut trace,
        )
        .await;

    let section = &draft.sections[0];
    assert_eq!(section.status, DraftStatus::Blocked);
    assert!(section.body.is_empty());
    assert!(section.evidence.is_empty());
    assert_eq!(section.missing_items.len(), 1);
    assert!(section.satisfies_evidence_rule());

    let attempts = trace
        .events()
        .iter()
        .filter(|event| event.action == "generate_attempt")
        .count();
    assert_eq!(attempts, 3);
    assert!(trace
        .events()
        .iter()
        .any(|event| event.action == "generate_exhausted"));
}

#[tokio::test]
async fn sections_processed_in_template_order() {
    init_tracing();
    let capability = Scripted::new(vec![Step::Succeed]);
    let orchestrator = Orchestrator::new(fast_policy());
    let mut trace = RunTrace::new();

    let draft = orchestrator
        .generate_draft(
            &model(&["first", "second", "third"]),
            &EvidenceBundle::default(),
            &[],
            &capability,
            &mut trace,
        )
        .await;

    let ids: Vec<_> = draft
        .sections
        .iter()
        .map(|section| section.section_id.as_str())
        .collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn answered_context_is_routed_to_its_section() {
    init_tracing();
    let capability = Scripted::new(vec![Step::Succeed]);
    let orchestrator = Orchestrator::new(fast_policy());
    let mut trace = RunTrace::new();

    let mut answered = MissingItem::new("owner", "a", "Who owns the model?");
    answered.user_response = "Alice".to_string();
    let unanswered = MissingItem::new("cadence", "b", "Review cadence?");

    orchestrator
        .generate_draft(
            &model(&["a", "b"]),
            &EvidenceBundle::default(),
            &[answered, unanswered],
            &capability,
            &mut trace,
        )
        .await;

    let contexts = capability.contexts_seen();
    assert_eq!(contexts.len(), 2);
    assert!(contexts[0].contains("owner: Alice"));
    assert!(contexts[1].is_empty());
}
