//! Remote embeddings client for OpenAI-compatible `/embeddings` endpoints
//! (Mistral by default).
//!
//! No retry loop here: a failed call is retried exactly once, by the
//! provider's fallback to the local model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embeddings::{EmbeddingBackend, EmbeddingError};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Clone)]
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl RemoteEmbedder {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Backend {
                backend: model.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model,
            dimension,
            timeout,
        })
    }

    fn backend_error(&self, message: impl Into<String>) -> EmbeddingError {
        EmbeddingError::Backend {
            backend: self.model.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for RemoteEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout {
                        backend: self.model.clone(),
                        timeout: self.timeout,
                    }
                } else {
                    self.backend_error(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(self.backend_error(format!("status {}: {message}", status.as_u16())));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| self.backend_error(format!("invalid response body: {e}")))?;
        parsed.data.sort_by_key(|d| d.index);

        debug!(
            "Remote embeddings generated: {} vectors from {}",
            parsed.data.len(),
            self.model
        );
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
