//! Full pipeline: template → generation → draft contract → review → apply,
//! with the context ledger carrying a human answer across two runs.

use async_trait::async_trait;
use charter_apply::{apply, ApplyOptions, CHECKED_GLYPH};
use charter_engine::{
    EvidenceBundle, EvidenceRef, GenerationCapability, GenerationFailure, GenerationRequest,
    Orchestrator, RetryPolicy, RunTrace,
};
use charter_model::{
    CheckboxToken, DraftSection, DraftStatus, MissingItem, TemplateFormat,
};
use charter_template::validate;
use std::time::Duration;

const TEMPLATE: &str = "\
## [FILL][ID:scope] Scope

[[SECTION_CONTENT]]

KPI defined: [[CHECK:kpi_defined]]

## [FILL][ID:owner] Ownership

[[SECTION_CONTENT]]

## [SKIP][ID:notes] Reviewer Notes

Reserved.
";

/// Deterministic stand-in for the LLM-backed producer: cites evidence for
/// `scope`, raises an ownership question unless the context answers it.
struct EvidenceBacked;

#[async_trait]
impl GenerationCapability for EvidenceBacked {
    async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<DraftSection, GenerationFailure> {
        let section_id = request.section.id.clone();
        if section_id == "scope" {
            return Ok(DraftSection {
                section_id,
                title: String::new(),
                status: DraftStatus::Complete,
                checkboxes: vec![CheckboxToken::new("kpi_defined", true)],
                attachments: Vec::new(),
                evidence: request
                    .evidence
                    .refs
                    .iter()
                    .map(|entry| entry.source.clone())
                    .collect(),
                missing_items: Vec::new(),
                body: "Weekly churn scoring for retail accounts.".to_string(),
            });
        }
        if request.context.contains("owner:") {
            let answer = request.context.trim().to_string();
            return Ok(DraftSection {
                section_id,
                title: String::new(),
                status: DraftStatus::Complete,
                checkboxes: Vec::new(),
                attachments: Vec::new(),
                evidence: vec!["additional-context".to_string()],
                missing_items: Vec::new(),
                body: format!("Ownership recorded from reviewer input ({answer})."),
            });
        }
        Ok(DraftSection {
            section_id: section_id.clone(),
            title: String::new(),
            status: DraftStatus::Partial,
            checkboxes: Vec::new(),
            attachments: Vec::new(),
            evidence: Vec::new(),
            missing_items: vec![MissingItem::new(
                "owner",
                section_id,
                "Who owns the model?",
            )],
            body: "Ownership is not documented in the codebase.".to_string(),
        })
    }
}

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        attempt_timeout: Duration::from_millis(200),
        backoff_base: Duration::ZERO,
    }
}

#[tokio::test]
async fn draft_review_apply_with_context_carryover() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("charter.md");
    std::fs::write(&template_path, TEMPLATE).unwrap();
    let context_path = dir.path().join("additional-context.md");

    // Parse + validate the template.
    let (model, errors) = charter_template::parse(TEMPLATE, TemplateFormat::Markdown);
    assert!(errors.is_empty());
    assert!(validate(&model).is_empty());

    let evidence = EvidenceBundle::new(vec![EvidenceRef::new(
        "src/score.py:12",
        "weekly batch scoring entrypoint",
    )]);
    let orchestrator = Orchestrator::new(policy());

    // Run 1: no context yet; the ownership question lands in the ledger.
    let mut trace = RunTrace::new();
    let context = charter_context::load(&context_path).unwrap();
    let draft = orchestrator
        .generate_draft(&model, &evidence, &context, &EvidenceBacked, &mut trace)
        .await;
    assert_eq!(draft.sections.len(), 2);
    assert_eq!(draft.section("owner").unwrap().status, DraftStatus::Partial);

    let merged = charter_context::merge(&context, &draft.missing_items(), &model.section_order());
    charter_context::write(&merged, &context_path).unwrap();
    charter_engine::write_run_artifacts(&dir.path().join("run-1"), &draft, &trace).unwrap();

    // A human answers the question in the ledger file.
    let answered = std::fs::read_to_string(&context_path)
        .unwrap()
        .replace("user_response:", "user_response: Alice (Model Risk)");
    std::fs::write(&context_path, answered).unwrap();

    // Run 2: the answer is routed back into generation and preserved by merge.
    let mut trace = RunTrace::new();
    let context = charter_context::load(&context_path).unwrap();
    assert_eq!(context[0].user_response, "Alice (Model Risk)");
    let draft = orchestrator
        .generate_draft(&model, &evidence, &context, &EvidenceBacked, &mut trace)
        .await;
    let owner = draft.section("owner").unwrap();
    assert_eq!(owner.status, DraftStatus::Complete);
    assert!(owner.body.contains("Alice (Model Risk)"));

    let merged = charter_context::merge(&context, &draft.missing_items(), &model.section_order());
    assert_eq!(merged[0].user_response, "Alice (Model Risk)");

    // Reviewer round trip through the draft contract.
    let text = charter_draft::serialize(&draft).unwrap();
    let outcome = charter_draft::parse(&text);
    assert!(outcome.is_valid(), "errors: {:?}", outcome.errors);
    assert_eq!(outcome.model, draft);

    // Apply onto a copy of the template.
    let out_path = dir.path().join("applied.md");
    let report = apply(
        &template_path,
        &outcome.model,
        &out_path,
        &ApplyOptions::default(),
    )
    .unwrap();
    assert!(report.unresolved_section_ids.is_empty());

    let output = std::fs::read_to_string(&out_path).unwrap();
    assert!(output.contains("Weekly churn scoring for retail accounts."));
    assert!(output.contains(CHECKED_GLYPH));
    assert!(output.contains("Reserved."));
    assert!(output.contains("<!-- charter:applied"));
}
