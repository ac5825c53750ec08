//! Charter data model
//!
//! Canonical in-memory representation shared by the template parser, draft
//! codec, context ledger, and merge/apply engine:
//! - [`Section`] / [`SectionModel`] — parsed template sections
//! - [`DraftSection`] / [`DraftModel`] — generated/reviewed counterparts
//! - [`MissingItem`] — durable question/answer entries for the context ledger
//! - [`ContentDigest`] — blake3 digest used by the apply marker
//! - [`ExitStatus`] — failure taxonomy surfaced to the (non-core) CLI
//!
//! Everything here is pure data plus invariant queries; no component in this
//! crate touches the filesystem.

mod digest;
mod draft;
mod report;
mod section;
mod status;

pub use digest::{ContentDigest, DigestError};
pub use draft::{CheckboxToken, DraftModel, DraftSection, DraftStatus, MissingItem};
pub use report::{AppliedDocument, ApplyMarker, MARKER_PREFIX};
pub use section::{ContentAnchor, Section, SectionModel, SectionTag, TemplateFormat};
pub use status::ExitStatus;
