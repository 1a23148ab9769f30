//! Embedding providers.
//!
//! This module provides:
//! - The [`EmbeddingProvider`] trait used at index-build and query time
//! - Google Gemini and Ollama HTTP clients
//! - A deterministic offline hashing embedder

mod gemini;
mod hashing;
mod ollama;

use std::sync::Arc;

use async_trait::async_trait;

pub use gemini::GeminiEmbedder;
pub use hashing::{hashing_embedding, HashingEmbedder, HASHING_DIM};
pub use ollama::OllamaEmbedder;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::EmbeddingError;
use crate::Result;

/// Computes fixed-dimension vectors for text.
///
/// Identical input must yield index-compatible vectors across calls.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier recorded in the index.
    fn model_name(&self) -> &str;

    /// Embed document windows, one vector per input in order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()).into())
    }
}

/// Create the embedding provider selected by `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn create_embedder(config: &ProviderConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiEmbedder::new(config)?),
        ProviderKind::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        ProviderKind::Placeholder => Arc::new(HashingEmbedder::new()),
    };

    tracing::info!(
        provider = %config.kind,
        model = provider.model_name(),
        "Embedding provider initialized"
    );
    Ok(provider)
}

/// Shared HTTP client settings for provider calls.
pub(crate) fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
}

/// Turn a non-success response into a status error carrying the body.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err((status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_placeholder_embedder() {
        let config = ProviderConfig::for_kind(ProviderKind::Placeholder);
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.model_name(), "hashing-384");

        let v = embedder.embed_query("memory management").await.unwrap();
        assert_eq!(v.len(), HASHING_DIM);
    }

    #[tokio::test]
    async fn test_default_embed_query_uses_documents() {
        let embedder = HashingEmbedder::new();
        let docs = embedder
            .embed_documents(&["paging and segmentation".to_string()])
            .await
            .unwrap();
        let query = embedder.embed_query("paging and segmentation").await.unwrap();
        assert_eq!(docs[0], query);
    }
}
