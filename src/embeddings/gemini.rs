//! Google Gemini embeddings (`batchEmbedContents`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_status, http_client, EmbeddingProvider};
use crate::config::ProviderConfig;
use crate::error::EmbeddingError;
use crate::{Error, Result};

/// Requests per `batchEmbedContents` call accepted by the API.
const MAX_BATCH: usize = 100;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Deserialize)]
struct Values {
    values: Vec<f32>,
}

/// Embedding client for the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiEmbedder {
    /// Create a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::config("gemini embeddings require an API key"))?;

        Ok(Self {
            client: http_client().map_err(EmbeddingError::Request)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: qualified_model(&config.embedding_model),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/{}:batchEmbedContents", self.base_url, self.model)
    }

    async fn embed_batch(&self, texts: &[String], task_type: &'static str) -> Result<Vec<Vec<f32>>> {
        let body = BatchRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &self.model,
                    content: Content {
                        parts: [Part { text }],
                    },
                    task_type,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(EmbeddingError::from)?;

        let response = check_status(response)
            .await
            .map_err(|(status, body)| EmbeddingError::Status { status, body })?;

        let parsed: BatchResponse = response.json().await.map_err(EmbeddingError::from)?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                parsed.embeddings.len()
            ))
            .into());
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            embeddings.extend(self.embed_batch(batch, "RETRIEVAL_DOCUMENT").await?);
        }

        tracing::debug!(count = texts.len(), model = %self.model, "Embedded documents");
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()], "RETRIEVAL_QUERY")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()).into())
    }
}

/// Ensure the model name carries the `models/` resource prefix.
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
