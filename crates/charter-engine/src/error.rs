//! Engine errors

use std::path::PathBuf;

/// Errors during orchestration artifact handling
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Filesystem failure
    #[error("io error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Draft contract serialization failed
    #[error("draft serialization error: {0}")]
    Draft(#[from] serde_yaml::Error),

    /// JSON artifact serialization failed
    #[error("artifact serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an IO error for a path
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
