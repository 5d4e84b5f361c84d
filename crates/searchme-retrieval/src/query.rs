//! Query engine: embed, search, join back to records.

use std::path::PathBuf;
use std::sync::Arc;

use searchme_embeddings::EmbeddingModel;
use searchme_types::MetadataRecord;
use searchme_vector::{HnswIndex, RecordStore, VectorIndex};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::QueryError;

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub path: PathBuf,
    /// Squared L2 distance between query and file embeddings; lower is closer
    pub distance: f32,
    pub record: MetadataRecord,
}

/// Read-only search over a [`RecordStore`].
pub struct QueryEngine<'a, I: VectorIndex = HnswIndex> {
    embedder: Arc<dyn EmbeddingModel>,
    store: &'a RecordStore<I>,
}

impl<'a, I: VectorIndex> QueryEngine<'a, I> {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, store: &'a RecordStore<I>) -> Self {
        Self { embedder, store }
    }

    /// The `k` files closest to `query`, closest first.
    ///
    /// Fails with [`QueryError::NoIndex`] when the store holds no vectors.
    /// Candidates the store cannot resolve to a record are dropped, so
    /// fewer than `k` hits may come back.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, QueryError> {
        if !self.store.has_index() || self.store.is_empty() {
            return Err(QueryError::NoIndex);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query)?;
        let neighbors = self.store.nearest(&embedding, k)?;

        let hits: Vec<SearchHit> = neighbors
            .into_iter()
            .filter(|n| n.distance.is_finite())
            .filter_map(|n| match self.store.lookup(n.position) {
                Some((path, record)) => Some(SearchHit {
                    path: path.to_path_buf(),
                    distance: n.distance,
                    record: record.clone(),
                }),
                None => {
                    warn!(position = %n.position, "Search hit has no record; dropping");
                    None
                }
            })
            .take(k)
            .collect();

        debug!(query, k, found = hits.len(), "Search complete");
        Ok(hits)
    }
}
