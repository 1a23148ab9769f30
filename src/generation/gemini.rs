//! Google Gemini generation (`generateContent`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{build_prompt, ChatTurn, GenerativeModel, MAX_OUTPUT_TOKENS, TEMPERATURE, TOP_P};
use crate::config::ProviderConfig;
use crate::embeddings::{check_status, http_client};
use crate::error::GenerationError;
use crate::index::SearchHit;
use crate::{Error, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Generation client for the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
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
            .ok_or_else(|| Error::config("gemini generation requires an API key"))?;

        Ok(Self {
            client: http_client().map_err(GenerationError::Request)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.chat_model.trim_start_matches("models/").to_string(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// History as alternating user/model turns followed by the prompt.
fn conversation<'a>(history: &'a [ChatTurn], prompt: &'a str) -> Vec<Content<'a>> {
    let mut contents = Vec::with_capacity(history.len() * 2 + 1);
    for turn in history {
        contents.push(Content {
            role: "user",
            parts: [Part { text: &turn.user }],
        });
        contents.push(Content {
            role: "model",
            parts: [Part {
                text: &turn.assistant,
            }],
        });
    }
    contents.push(Content {
        role: "user",
        parts: [Part { text: prompt }],
    });
    contents
}

#[async_trait]
impl GenerativeModel for GeminiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        question: &str,
        context: &[SearchHit<'_>],
        history: &[ChatTurn],
    ) -> Result<String> {
        let prompt = build_prompt(question, context);
        let body = GenerateRequest {
            contents: conversation(history, &prompt),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::from)?;

        let response = check_status(response)
            .await
            .map_err(|(status, body)| GenerationError::Status { status, body })?;

        let parsed: GenerateResponse = response.json().await.map_err(GenerationError::from)?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Empty(format!("{} returned no text", self.model)).into());
        }

        tracing::debug!(model = %self.model, chars = text.len(), "Answer generated");
        Ok(text)
    }
}
