//! Error types for the indexing engine.

use searchme_vector::VectorError;
use thiserror::Error;

/// Conditions that stop a walk.
///
/// Per-file problems are not errors; they come back as
/// [`FileOutcome::Skipped`](crate::FileOutcome::Skipped).
#[derive(Error, Debug)]
pub enum IndexingError {
    /// The vector index rejected an insert (e.g. dimension mismatch)
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}
