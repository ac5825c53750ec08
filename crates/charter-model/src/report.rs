//! Apply output artifacts
//!
//! [`ApplyMarker`] is the opaque metadata stamped into an applied document;
//! its presence is the sole signal that an apply has already occurred.
//! [`AppliedDocument`] records where the output landed and which sections
//! still carry open questions.

use crate::digest::ContentDigest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ulid::Ulid;

/// Prefix shared by all rendered apply markers
pub const MARKER_PREFIX: &str = "charter:applied";

/// Metadata embedded in an applied document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyMarker {
    /// Run identifier
    pub run_id: Ulid,
    /// Digest of the serialized draft that was applied
    pub digest: ContentDigest,
    /// When the apply occurred
    pub applied_at: DateTime<Utc>,
}

impl ApplyMarker {
    /// Create a marker for the given draft digest, stamped now
    #[inline]
    #[must_use]
    pub fn new(digest: ContentDigest) -> Self {
        Self {
            run_id: Ulid::new(),
            digest,
            applied_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for ApplyMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{MARKER_PREFIX} run={} digest={} at={}",
            self.run_id,
            self.digest,
            self.applied_at.to_rfc3339()
        )
    }
}

/// Result of a successful apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDocument {
    /// Where the output copy was written (never the input path)
    pub output_path: PathBuf,
    /// Marker stamped into the output
    pub marker: ApplyMarker,
    /// Fill sections applied with a non-complete status
    pub unresolved_section_ids: Vec<String>,
}
