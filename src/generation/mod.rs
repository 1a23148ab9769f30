//! Generative models that compose answers from retrieved context.
//!
//! This module provides:
//! - The [`GenerativeModel`] trait used by the answer engine
//! - Google Gemini and Ollama HTTP clients
//! - An offline extractive model for development and tests

mod gemini;
mod ollama;
mod prompt;

use std::sync::Arc;

use async_trait::async_trait;

pub use gemini::GeminiGenerator;
pub use ollama::OllamaGenerator;
pub use prompt::{build_prompt, SYSTEM_INSTRUCTION};

use crate::config::{ProviderConfig, ProviderKind};
use crate::index::SearchHit;
use crate::Result;

/// Sampling temperature for answer generation.
pub const TEMPERATURE: f32 = 0.3;

/// Nucleus sampling threshold.
pub const TOP_P: f32 = 0.95;

/// Upper bound on generated tokens.
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

/// One earlier exchange of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// What the user asked.
    pub user: String,
    /// What the assistant answered.
    pub assistant: String,
}

impl ChatTurn {
    /// Create a turn.
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Produces an answer from a question, retrieved context and prior turns.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier.
    fn model_name(&self) -> &str;

    /// Generate an answer.
    async fn generate(
        &self,
        question: &str,
        context: &[SearchHit<'_>],
        history: &[ChatTurn],
    ) -> Result<String>;
}

/// Offline model that answers with the best-matching window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

/// Answer returned by [`ExtractiveGenerator`] when nothing was retrieved.
pub const NO_CONTEXT_ANSWER: &str = "I could not find anything about that in the indexed documents.";

#[async_trait]
impl GenerativeModel for ExtractiveGenerator {
    fn model_name(&self) -> &str {
        "extractive"
    }

    async fn generate(
        &self,
        _question: &str,
        context: &[SearchHit<'_>],
        _history: &[ChatTurn],
    ) -> Result<String> {
        Ok(context
            .first()
            .map_or_else(|| NO_CONTEXT_ANSWER.to_string(), |hit| hit.window.text.clone()))
    }
}

/// Create the generative model selected by `config`.
///
/// # Errors
///
/// Returns an error if the provider is misconfigured.
pub fn create_generator(config: &ProviderConfig) -> Result<Arc<dyn GenerativeModel>> {
    let model: Arc<dyn GenerativeModel> = match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiGenerator::new(config)?),
        ProviderKind::Ollama => Arc::new(OllamaGenerator::new(config)?),
        ProviderKind::Placeholder => Arc::new(ExtractiveGenerator),
    };

    tracing::info!(
        provider = %config.kind,
        model = model.model_name(),
        "Generative model initialized"
    );
    Ok(model)
}
