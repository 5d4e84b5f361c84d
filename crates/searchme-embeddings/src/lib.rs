//! # searchme-embeddings
//!
//! Turns context strings into fixed-length vectors.
//!
//! The [`EmbeddingModel`] trait is the seam the indexing and query engines
//! depend on; [`CandleEmbedder`] is the production implementation running a
//! sentence-transformers BERT model locally through Candle. Model files are
//! fetched from the HuggingFace Hub once and cached on disk.
//!
//! An embedder's dimension is fixed for its lifetime, and the vector index
//! created from its first output keeps that dimension.

pub mod cache;
pub mod candle;
pub mod error;
pub mod model;

pub use crate::candle::{CandleEmbedder, MAX_SEQ_LENGTH};
pub use cache::{resolve_model_files, ModelCache, ModelFiles, REQUIRED_FILES};
pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
