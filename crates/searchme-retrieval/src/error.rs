//! Query error types.

use searchme_embeddings::EmbeddingError;
use searchme_vector::VectorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    /// Nothing has been indexed or loaded
    #[error("No index available; index some files first")]
    NoIndex,

    /// The query could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The vector index failed the search
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}
