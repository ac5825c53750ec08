//! Draft contract codec for Charter
//!
//! The draft is the reviewable intermediate between generation and apply:
//! serialized from a [`charter_model::DraftModel`], hand-edited by a
//! reviewer, then parsed back under a strict per-section metadata contract.
//! Violations are collected as [`DraftFormatError`]s so one parse yields
//! complete diagnostics; any error marks the whole result invalid.

mod codec;
mod error;

pub use codec::{parse, serialize, DraftParseOutcome};
pub use error::{DraftFormatError, DraftFormatErrorKind};
