//! Generation orchestration for Charter
//!
//! Thin sequencing glue between the parsed template and the external content
//! producer: per fill section, call the injected [`GenerationCapability`]
//! under a bounded retry/timeout policy, record a structured trace, and
//! degrade exhausted sections to missing items instead of fabricating
//! content. Also writes the per-run artifact directory.

mod artifacts;
mod capability;
mod error;
mod orchestrator;
mod trace;

pub use artifacts::write_run_artifacts;
pub use capability::{
    EvidenceBundle, EvidenceRef, GenerationCapability, GenerationFailure, GenerationRequest,
};
pub use error::EngineError;
pub use orchestrator::{AttemptOutcome, Orchestrator, RetryPolicy};
pub use trace::{RunTrace, TraceEvent, TraceStatus};
