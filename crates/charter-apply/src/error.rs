//! Unsafe-apply errors
//!
//! This class is fail-fast: any of these aborts the whole apply before the
//! finalizing rename, leaving the filesystem unchanged.

use charter_model::{DigestError, ExitStatus};
use charter_template::SchemaError;
use std::path::PathBuf;

/// Reasons an apply is refused
#[derive(Debug, thiserror::Error)]
pub enum UnsafeApplyError {
    /// The re-parsed template failed schema validation
    #[error("template failed schema validation with {} error(s)", errors.len())]
    TemplateInvalid {
        /// Collected schema errors
        errors: Vec<SchemaError>,
    },

    /// An apply marker is already present and `force` was not set
    #[error("template already contains an apply marker; pass force to override")]
    AlreadyApplied,

    /// A fill-eligible template section has no matching draft section
    #[error("fill section '{section_id}' has no matching draft section")]
    MissingDraftSection {
        /// The unmatched template section
        section_id: String,
    },

    /// An insert targeted a skip/validator section
    #[error("refusing to write into protected section '{section_id}'")]
    ProtectedSection {
        /// The protected target
        section_id: String,
    },

    /// A fill section offers no block the body could be inserted into
    #[error("section '{section_id}' has no writable body block beneath its heading")]
    NoWritableBody {
        /// The unwritable section
        section_id: String,
    },

    /// The template path has no recognized host format extension
    #[error("unsupported template extension for '{path}'; expected .md, .markdown, or .json")]
    UnsupportedTemplate {
        /// Offending path
        path: PathBuf,
    },

    /// The output path equals the template path
    #[error("output path equals the template input path: {path}")]
    OutputIsInput {
        /// Offending path
        path: PathBuf,
    },

    /// Draft digest computation failed
    #[error("draft digest error: {0}")]
    Digest(#[from] DigestError),

    /// Filesystem failure
    #[error("io error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl UnsafeApplyError {
    /// Create an IO error for a path
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The exit class every unsafe apply maps to
    #[inline]
    #[must_use]
    pub const fn exit_status(&self) -> ExitStatus {
        match self {
            Self::TemplateInvalid { .. } => ExitStatus::SchemaInvalidTemplate,
            _ => ExitStatus::UnsafeApply,
        }
    }
}
