//! Ollama embeddings (`/api/embed`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_status, http_client, EmbeddingProvider};
use crate::config::ProviderConfig;
use crate::error::EmbeddingError;
use crate::Result;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

/// Embedding client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    /// Create a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http_client().map_err(EmbeddingError::Request)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.url())
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(EmbeddingError::from)?;

        let response = check_status(response)
            .await
            .map_err(|(status, body)| EmbeddingError::Status { status, body })?;

        let parsed: EmbedResponse = response.json().await.map_err(EmbeddingError::from)?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                parsed.embeddings.len()
            ))
            .into());
        }

        tracing::debug!(count = texts.len(), model = %self.model, "Embedded documents");
        Ok(parsed.embeddings)
    }
}
