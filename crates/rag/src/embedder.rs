//! `Embedder` adapter backed by a configurable HTTP embedding endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use credit_explain_core::{Embedder, Result};

use crate::RagError;

#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

/// An `Embedder` that calls a configurable HTTP embedding endpoint.
///
/// The endpoint must return a single dense vector per call; dimensionality
/// is whatever the configured model returns and is never validated here —
/// the `VectorIndex` the same vector is searched against is the source of
/// truth.
pub struct HttpEmbedder {
    client: Client,
    config: EmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: EmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&EmbedRequest {
                model: &self.config.model,
                input: text,
            })
            .send()
            .await
            .map_err(RagError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!("embedding request rejected ({status}): {body}")).into());
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("invalid embedding response: {e}")))?;

        Ok(parsed.embedding)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
