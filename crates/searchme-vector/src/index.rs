//! Vector index trait and types.

use std::path::Path;

use searchme_embeddings::Embedding;
use searchme_types::IndexPosition;

use crate::error::VectorError;

/// One search hit from the vector index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: IndexPosition,
    /// Squared L2 distance; lower is closer
    pub distance: f32,
}

/// Append-only nearest-neighbour index.
///
/// The caller assigns positions. An index never changes dimension after
/// creation and never removes vectors.
pub trait VectorIndex: Sized + Send {
    /// Tuning knobs passed through from the record store.
    type Config: Clone + Default + Send;

    fn create(dimension: usize, config: &Self::Config) -> Result<Self, VectorError>;

    /// Load an index previously written by [`save`](Self::save).
    fn load(path: &Path, dimension: usize, config: &Self::Config) -> Result<Self, VectorError>;

    fn save(&self, path: &Path) -> Result<(), VectorError>;

    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add(&mut self, position: IndexPosition, embedding: &Embedding) -> Result<(), VectorError>;

    /// Up to `k` neighbours ordered by ascending distance.
    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, VectorError>;
}
