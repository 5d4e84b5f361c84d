//! Error types shared across searchme crates.

use thiserror::Error;

/// Errors raised while building records or loading settings.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The file extension is never indexed
    #[error("Unsupported file type: {0}")]
    RejectedExtension(String),

    /// The path cannot be persisted because it is not valid UTF-8
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}
