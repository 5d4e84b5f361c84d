//! Vector index and record store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the vector index or from mutating the record store.
#[derive(Debug, Error)]
pub enum VectorError {
    /// usearch index error
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding dimension differs from the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// No index has been created or loaded
    #[error("Index not initialized")]
    NotInitialized,

    /// The record may never be stored
    #[error("Rejected record for {0}")]
    RejectedRecord(PathBuf),
}

/// Errors from saving or loading the persisted artifacts.
///
/// Every load error leaves the store empty.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing to save
    #[error("No files were indexed; nothing to save")]
    Empty,

    /// One or more artifacts are absent
    #[error("Missing index artifacts: {}", display_paths(.0))]
    MissingArtifacts(Vec<PathBuf>),

    /// An artifact could not be parsed
    #[error("Corrupt index artifact: {0}")]
    Corrupt(String),

    /// The in-memory state could not be encoded
    #[error("Failed to encode index artifact: {0}")]
    Encode(String),

    /// Artifacts parsed but disagree with each other
    #[error("Inconsistent index: {vectors} vectors, {positions} positions, {records} records")]
    Inconsistent {
        vectors: usize,
        positions: usize,
        records: usize,
    },

    /// Vector index error while saving or loading
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
