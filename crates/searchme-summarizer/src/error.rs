//! Error type for summarization.

use thiserror::Error;

/// Errors from talking to the language model.
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// Nothing listening at the endpoint
    #[error("Language model endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SummarizerError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SummarizerError::Unreachable(_)
            | SummarizerError::Request(_)
            | SummarizerError::Timeout => true,
            SummarizerError::Status { status, .. } => *status == 429 || *status >= 500,
            SummarizerError::Parse(_) | SummarizerError::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for SummarizerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SummarizerError::Timeout
        } else if err.is_connect() {
            SummarizerError::Unreachable(err.to_string())
        } else if err.is_decode() {
            SummarizerError::Parse(err.to_string())
        } else {
            SummarizerError::Request(err.to_string())
        }
    }
}
