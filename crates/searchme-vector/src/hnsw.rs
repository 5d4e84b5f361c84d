//! HNSW index implementation using usearch.
//!
//! Vectors are compared by squared Euclidean distance, so hits come back
//! closest first with distance 0 for an exact match.

use std::path::Path;

use searchme_embeddings::Embedding;
use searchme_types::IndexPosition;
use tracing::{debug, info};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::error::VectorError;
use crate::index::{Neighbor, VectorIndex};

/// HNSW index configuration
#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Number of connections per layer (M parameter)
    pub connectivity: usize,
    /// Build-time search depth (ef_construction)
    pub expansion_add: usize,
    /// Query-time search depth (ef_search)
    pub expansion_search: usize,
    /// Slots reserved when the index is created
    pub initial_capacity: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            connectivity: 16,
            expansion_add: 128,
            expansion_search: 64,
            initial_capacity: 1024,
        }
    }
}

impl HnswConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    fn options(&self, dimension: usize) -> IndexOptions {
        IndexOptions {
            dimensions: dimension,
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            connectivity: self.connectivity,
            expansion_add: self.expansion_add,
            expansion_search: self.expansion_search,
            multi: false,
        }
    }
}

/// usearch HNSW index keyed by position.
pub struct HnswIndex {
    index: Index,
    dimension: usize,
}

impl HnswIndex {
    fn path_str(path: &Path) -> Result<&str, VectorError> {
        path.to_str()
            .ok_or_else(|| VectorError::Index("Invalid path encoding".to_string()))
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<(), VectorError> {
        if embedding.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.dimension(),
            });
        }
        Ok(())
    }

    /// Grow capacity ahead of an insert; usearch rejects adds past it.
    fn ensure_capacity(&self) -> Result<(), VectorError> {
        let capacity = self.index.capacity();
        if self.index.size() >= capacity {
            let grown = (capacity * 2).max(64);
            self.index
                .reserve(grown)
                .map_err(|e| VectorError::Index(e.to_string()))?;
            debug!(capacity = grown, "Grew vector index");
        }
        Ok(())
    }
}

impl VectorIndex for HnswIndex {
    type Config = HnswConfig;

    fn create(dimension: usize, config: &HnswConfig) -> Result<Self, VectorError> {
        let index =
            Index::new(&config.options(dimension)).map_err(|e| VectorError::Index(e.to_string()))?;
        index
            .reserve(config.initial_capacity)
            .map_err(|e| VectorError::Index(e.to_string()))?;

        info!(dim = dimension, "Created vector index");
        Ok(Self { index, dimension })
    }

    fn load(path: &Path, dimension: usize, config: &HnswConfig) -> Result<Self, VectorError> {
        let index =
            Index::new(&config.options(dimension)).map_err(|e| VectorError::Index(e.to_string()))?;
        index
            .load(Self::path_str(path)?)
            .map_err(|e| VectorError::Index(format!("Failed to load: {}", e)))?;

        if index.dimensions() != dimension {
            return Err(VectorError::DimensionMismatch {
                expected: dimension,
                actual: index.dimensions(),
            });
        }

        debug!(path = %path.display(), vectors = index.size(), "Loaded vector index");
        Ok(Self { index, dimension })
    }

    fn save(&self, path: &Path) -> Result<(), VectorError> {
        self.index
            .save(Self::path_str(path)?)
            .map_err(|e| VectorError::Index(format!("Failed to save: {}", e)))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.index.size()
    }

    fn add(&mut self, position: IndexPosition, embedding: &Embedding) -> Result<(), VectorError> {
        self.check_dimension(embedding)?;
        self.ensure_capacity()?;
        self.index
            .add(position.get(), embedding.as_slice())
            .map_err(|e| VectorError::Index(e.to_string()))
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.check_dimension(query)?;
        if k == 0 || self.index.size() == 0 {
            return Ok(Vec::new());
        }

        let matches = self
            .index
            .search(query.as_slice(), k)
            .map_err(|e| VectorError::Index(e.to_string()))?;

        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .map(|(&key, &distance)| Neighbor {
                position: IndexPosition::new(key),
                distance,
            })
            .collect())
    }
}
