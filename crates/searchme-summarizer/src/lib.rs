//! # searchme-summarizer
//!
//! Turns search hits into an answer. A [`Summarizer`] asks a language
//! model; [`respond`] wraps it so that any failure degrades to the plain
//! [`fallback_listing`] instead of an error.

pub mod error;
pub mod ollama;
pub mod prompt;

pub use error::SummarizerError;
pub use ollama::{OllamaConfig, OllamaSummarizer};
pub use prompt::{build_prompt, fallback_listing, LISTING_PREVIEW_CHARS, NO_MATCHES};

use async_trait::async_trait;
use searchme_retrieval::SearchHit;
use tracing::warn;

/// Pluggable answer generator.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Answer `query` from `hits`, which are ordered closest first.
    async fn summarize(&self, query: &str, hits: &[SearchHit]) -> Result<String, SummarizerError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

/// Model answer for `hits`, or the plain listing when there is none.
///
/// Empty hit lists never reach the model.
pub async fn respond(summarizer: &dyn Summarizer, query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return fallback_listing(hits);
    }

    match summarizer.summarize(query, hits).await {
        Ok(answer) => answer,
        Err(SummarizerError::Unreachable(reason)) => {
            warn!(
                model = summarizer.model_name(),
                %reason,
                "Language model not reachable; start it with `ollama serve` and `ollama pull {}`",
                summarizer.model_name()
            );
            fallback_listing(hits)
        }
        Err(e) => {
            warn!(model = summarizer.model_name(), error = %e, "Summarization failed");
            fallback_listing(hits)
        }
    }
}
