//! Context ledger for Charter
//!
//! Durable question/answer pairs bridging runs: when generation cannot find a
//! fact, the question lands here; a human answers it in place; the next run
//! feeds the answer back into generation. Merging preserves recorded human
//! input — entries are superseded only by new questions, never auto-pruned.
//!
//! This crate is the only writer of the context file.

mod error;
mod ledger;

pub use error::ContextError;
pub use ledger::{load, merge, parse_text, render, responses_by_section, write};
