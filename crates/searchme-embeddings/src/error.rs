//! Embedding error types.

use thiserror::Error;

/// Errors that can occur while loading a model or embedding text.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Candle model error
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model config is missing or unreadable
    #[error("Invalid model config: {0}")]
    InvalidConfig(String),

    /// Download error
    #[error("Failed to download model: {0}")]
    Download(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The model produced no vector for an input
    #[error("Model returned no embedding")]
    EmptyOutput,
}
