//! Offline feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed into one of [`HASHING_DIM`]
//! buckets with a sign bit; the bucket counts are L2-normalized. Texts that
//! share words score higher, which is enough for development and tests
//! without a model server.

use async_trait::async_trait;

use super::EmbeddingProvider;
use crate::Result;

/// Dimension of hashing embeddings.
pub const HASHING_DIM: usize = 384;

/// Deterministic embedder with no external dependencies.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model: String,
}

impl HashingEmbedder {
    /// Create a new hashing embedder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: format!("hashing-{HASHING_DIM}"),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| hashing_embedding(t)).collect())
    }
}

/// Feature-hashed, L2-normalized embedding of `text`.
///
/// Text without tokens maps to the zero vector.
#[must_use]
pub fn hashing_embedding(text: &str) -> Vec<f32> {
    let mut embedding = vec![0.0f32; HASHING_DIM];

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        let hash = blake3::hash(token.as_bytes());
        let bytes = hash.as_bytes();
        let bucket = u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]);
        #[allow(clippy::cast_possible_truncation)]
        let slot = (bucket % HASHING_DIM as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        embedding[slot] += sign;
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut embedding {
            *v /= norm;
        }
    }

    embedding
}
