//! Ollama generation (`/api/chat`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{build_prompt, ChatTurn, GenerativeModel, MAX_OUTPUT_TOKENS, TEMPERATURE, TOP_P};
use crate::config::ProviderConfig;
use crate::embeddings::{check_status, http_client};
use crate::error::GenerationError;
use crate::index::SearchHit;
use crate::Result;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Generation client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// Create a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http_client().map_err(GenerationError::Request)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.chat_model.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

fn messages<'a>(history: &'a [ChatTurn], prompt: &'a str) -> Vec<Message<'a>> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 1);
    for turn in history {
        messages.push(Message {
            role: "user",
            content: &turn.user,
        });
        messages.push(Message {
            role: "assistant",
            content: &turn.assistant,
        });
    }
    messages.push(Message {
        role: "user",
        content: prompt,
    });
    messages
}

#[async_trait]
impl GenerativeModel for OllamaGenerator {
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
        let body = ChatRequest {
            model: &self.model,
            messages: messages(history, &prompt),
            stream: false,
            options: Options {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                num_predict: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::from)?;

        let response = check_status(response)
            .await
            .map_err(|(status, body)| GenerationError::Status { status, body })?;

        let parsed: ChatResponse = response.json().await.map_err(GenerationError::from)?;
        let text = parsed.message.map(|m| m.content).unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Empty(format!("{} returned no text", self.model)).into());
        }

        tracing::debug!(model = %self.model, chars = text.len(), "Answer generated");
        Ok(text)
    }
}
