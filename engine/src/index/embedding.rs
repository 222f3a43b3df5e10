//! Embedding service trait and the OpenAI-compatible client.
//!
//! Both ingestion and querying go through an `EmbeddingProvider`; they must
//! use the same model or similarity scores stop meaning anything.

use async_trait::async_trait;
use reqwest::Client;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::secrets::{scrub_secrets, SecretString};

/// Service for turning text into vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, recorded in the collection at ingest time
    fn model(&self) -> &str;

    /// Embed each input text; the result has one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError>;
}

/// Client for `POST {base_url}/embeddings`
pub struct OpenAIEmbedder {
    base_url: String,
    model: String,
    api_key: SecretString,
    client: Client,
}

impl OpenAIEmbedder {
    /// # Errors
    /// Returns `EngineError::Config` if the HTTP client cannot be built.
    pub fn new(
        config: &EmbeddingConfig,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
        })
    }
}

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
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        tracing::debug!("Embedding {} text(s) with {}", texts.len(), self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.unsecure())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub_secrets(&response.text().await.unwrap_or_default());
            let message = format!("Embedding API error ({}): {}", status, text);
            return Err(if status.is_server_error() {
                EngineError::Transport(message)
            } else {
                EngineError::LLMProvider(message)
            });
        }

        let mut body: EmbeddingResponse = response.json().await.map_err(|e| {
            EngineError::LLMProvider(format!("Failed to parse embedding response: {}", e))
        })?;

        if body.data.len() != texts.len() {
            return Err(EngineError::LLMProvider(format!(
                "Embedding service returned {} vectors for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        // Unroutable base URL: any request would fail
        let config = EmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "text-embedding-3-small".to_string(),
        };
        let embedder =
            OpenAIEmbedder::new(&config, SecretString::new("sk-test"), Duration::from_secs(1))
                .unwrap();

        let vectors = embedder.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
        assert_eq!(embedder.model(), "text-embedding-3-small");
    }

    #[test]
    fn test_response_reordered_by_index() {
        let mut body: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]}"#,
        )
        .unwrap();
        body.data.sort_by_key(|d| d.index);
        assert_eq!(body.data[0].embedding, vec![1.0, 0.0]);
    }
}
