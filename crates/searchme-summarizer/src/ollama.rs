//! Summarizer backed by an Ollama-compatible `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use searchme_retrieval::SearchHit;
use searchme_types::SummarizerSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::SummarizerError;
use crate::prompt::build_prompt;
use crate::Summarizer;

/// Configuration for [`OllamaSummarizer`].
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Full URL of the generate endpoint
    pub endpoint: String,

    /// Model name (e.g., "mistral")
    pub model: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// First backoff delay between attempts
    pub initial_backoff: Duration,
}

impl OllamaConfig {
    pub fn from_settings(settings: &SummarizerSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            ..Default::default()
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "mistral".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Sends one non-streaming generate request per query.
pub struct OllamaSummarizer {
    client: Client,
    config: OllamaConfig,
}

impl OllamaSummarizer {
    pub fn new(config: OllamaConfig) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummarizerError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Call the endpoint, retrying transient failures.
    async fn call_api(&self, prompt: &str) -> Result<String, SummarizerError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_elapsed_time: Some(self.config.timeout * (self.config.max_retries + 1)),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, model = %self.config.model, "Calling generate endpoint");

            match self.generate(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_retryable() || attempts > self.config.max_retries {
                        error!(error = %e, attempts, "Generate request failed");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "Generate request failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Make a single generate request.
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            response: String,
        }

        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status { status, body });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::Parse(e.to_string()))?;

        Ok(body.response)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, query: &str, hits: &[SearchHit]) -> Result<String, SummarizerError> {
        let prompt = build_prompt(query, hits);
        self.call_api(&prompt).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
