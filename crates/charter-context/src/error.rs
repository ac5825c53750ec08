//! Context ledger errors

use std::path::PathBuf;

/// Errors during context file access
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// IO error reading or writing the context file
    #[error("io error on context file {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ContextError {
    /// Create an IO error for a path
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
