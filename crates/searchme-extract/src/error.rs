//! Extraction error types.

use std::path::PathBuf;

use searchme_types::TypesError;
use thiserror::Error;

/// Why a file produced no record.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file type is never indexed
    #[error("Unsupported file: {0}")]
    Unsupported(String),

    /// The file cannot be opened or stat'ed
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A format probe could not parse the file
    #[error("Failed to extract {path}: {reason}")]
    Failed { path: PathBuf, reason: String },
}

impl ExtractError {
    pub(crate) fn failed(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Failed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl From<TypesError> for ExtractError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::RejectedExtension(ext) => Self::Unsupported(ext),
            other => Self::Unsupported(other.to_string()),
        }
    }
}
