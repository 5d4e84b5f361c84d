//! Embedding model trait and vector type.

use crate::error::EmbeddingError;

/// A unit-length float vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Wrap `values`, scaling them to unit length.
    ///
    /// An all-zero vector is kept as is.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            Self {
                values: values.into_iter().map(|x| x / norm).collect(),
            }
        } else {
            Self { values }
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Squared Euclidean distance, the metric the vector index ranks by.
    ///
    /// Returns `f32::INFINITY` for embeddings of different dimension.
    pub fn squared_distance(&self, other: &Embedding) -> f32 {
        if self.dimension() != other.dimension() {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Static facts about a loaded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Short model name, e.g. `all-MiniLM-L6-v2`
    pub name: String,
    pub dimension: usize,
    /// Inputs longer than this many tokens are truncated
    pub max_sequence_length: usize,
}

/// Maps text to vectors of one fixed dimension.
pub trait EmbeddingModel: Send + Sync {
    fn info(&self) -> &ModelInfo;

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embed several texts. Output order matches input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dimension(&self) -> usize {
        self.info().dimension
    }
}
