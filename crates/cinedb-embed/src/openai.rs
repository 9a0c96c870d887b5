//! Remote embedding client for OpenAI-compatible `/embeddings` endpoints.
//!
//! One HTTP request per `embed` call. Failures map to `EmbeddingService`
//! with the HTTP status when there is one; nothing is retried here so rate
//! limit signals reach the caller intact.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cinedb_core::config::EmbeddingConfig;
use cinedb_core::error::{Error, Result};
use cinedb_core::traits::Embedder;

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dim: usize,
    id: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiEmbedder {
    /// `api_key` is passed in by the caller; this type never reads credentials itself.
    pub fn new(config: &EmbeddingConfig, api_key: impl Into<String>) -> Result<Self> {
        if config.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be greater than 0".into()));
        }
        if config.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("embedding.endpoint is empty".into()));
        }
        if config.endpoint.starts_with("http://") {
            tracing::warn!(endpoint = %config.endpoint, "embedding endpoint uses unencrypted HTTP");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("embedding http client: {e}")))?;
        let url = format!("{}/embeddings", config.endpoint.trim_end_matches('/'));
        let id = format!("openai:{}:d{}", config.model, config.dim);
        Ok(Self { client, url, api_key: api_key.into(), model: config.model.clone(), dim: config.dim, id })
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("dim", &self.dim)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest { input: text, model: &self.model, dimensions: self.dim };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or(body);
            tracing::debug!(status = status.as_u16(), "embedding request rejected");
            return Err(Error::EmbeddingService { status: Some(status.as_u16()), message });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("response parse: {e}")))?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::embedding("response contained no embeddings"))?;
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { got: vector.len(), expected: self.dim });
        }
        Ok(vector)
    }
}
