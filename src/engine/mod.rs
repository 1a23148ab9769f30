//! Retrieval-augmented answering over a vector index.
//!
//! The engine embeds the question, retrieves the closest windows and hands
//! them to the generative model together with prior turns. It keeps no
//! state between calls.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embeddings::EmbeddingProvider;
use crate::generation::{ChatTurn, GenerativeModel};
use crate::index::{SearchHit, VectorIndex};
use crate::{Error, Result};

/// Windows retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Speaker of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking.
    User,
    /// The service.
    Assistant,
    /// Any other role; ignored.
    #[serde(other)]
    Other,
}

/// One message of a client-supplied conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent the message.
    pub role: Role,
    /// Message text.
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A generated answer with the documents it drew on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text.
    pub message: String,
    /// File names of the retrieved documents, first-seen order.
    pub sources: Vec<String>,
}

/// Split a conversation into the current question and prior turns.
///
/// The question is the last user message. History is every message except
/// a trailing user message, read as consecutive `(user, assistant)` pairs;
/// pairs in any other order are dropped.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] if there are no messages or no user
/// message with content.
pub fn split_conversation(messages: &[Message]) -> Result<(String, Vec<ChatTurn>)> {
    let Some(last) = messages.last() else {
        return Err(Error::invalid_request("Invalid request format"));
    };

    let question = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .unwrap_or_default();

    if question.is_empty() {
        return Err(Error::invalid_request("No user query found"));
    }

    let earlier = if last.role == Role::User {
        &messages[..messages.len() - 1]
    } else {
        messages
    };

    let history = earlier
        .chunks_exact(2)
        .filter(|pair| pair[0].role == Role::User && pair[1].role == Role::Assistant)
        .map(|pair| ChatTurn::new(pair[0].content.clone(), pair[1].content.clone()))
        .collect();

    Ok((question, history))
}

/// File names of the hits' sources, deduplicated by full path.
#[must_use]
pub fn source_names(hits: &[SearchHit<'_>]) -> Vec<String> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter(|hit| seen.insert(hit.window.source.as_str()))
        .map(|hit| {
            Path::new(&hit.window.source)
                .file_name()
                .map_or_else(|| hit.window.source.clone(), |n| n.to_string_lossy().into_owned())
        })
        .collect()
}

/// Answers questions against one index snapshot.
pub struct AnswerEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerativeModel>,
    top_k: usize,
}

impl AnswerEngine {
    /// Create an engine over `index`.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override the number of retrieved windows.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Index this engine searches.
    #[must_use]
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Answer `question` given earlier turns.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding, search or generation fails.
    pub async fn answer(&self, question: &str, history: &[ChatTurn]) -> Result<Answer> {
        let hits = if self.index.is_empty() {
            Vec::new()
        } else {
            let query = self.embedder.embed_query(question).await?;
            self.index.search(&query, self.top_k)?
        };

        tracing::debug!(
            hits = hits.len(),
            best = hits.first().map(|h| h.score),
            history = history.len(),
            "Retrieved context"
        );

        let message = self.generator.generate(question, &hits, history).await?;

        Ok(Answer {
            message,
            sources: source_names(&hits),
        })
    }
}

impl std::fmt::Debug for AnswerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerEngine")
            .field("windows", &self.index.len())
            .field("embedder", &self.embedder.model_name())
            .field("generator", &self.generator.model_name())
            .field("top_k", &self.top_k)
            .finish()
    }
}
