//! In-memory vector index with brute-force cosine search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::Result;

/// An embedded text window with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedWindow {
    /// Path of the document the window came from.
    pub source: String,
    /// Window position within its document.
    pub index: usize,
    /// Window text.
    pub text: String,
    /// Embedding of `text`.
    pub embedding: Vec<f32>,
}

/// A search result borrowed from the index.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    /// Matching window.
    pub window: &'a IndexedWindow,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Searchable set of embedded windows.
///
/// Never mutated after construction; a rebuild produces a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    model: String,
    dimensions: usize,
    created_at: DateTime<Utc>,
    windows: Vec<IndexedWindow>,
}

impl VectorIndex {
    /// Build an index from embedded windows.
    ///
    /// # Errors
    ///
    /// Returns an error if windows disagree on embedding dimension.
    pub fn new(model: impl Into<String>, windows: Vec<IndexedWindow>) -> Result<Self> {
        let dimensions = windows.first().map_or(0, |w| w.embedding.len());

        if let Some(bad) = windows.iter().find(|w| w.embedding.len() != dimensions) {
            return Err(IndexError::DimensionMismatch {
                expected: dimensions,
                actual: bad.embedding.len(),
            }
            .into());
        }

        Ok(Self {
            model: model.into(),
            dimensions,
            created_at: Utc::now(),
            windows,
        })
    }

    /// Return the `k` windows most similar to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` has the wrong dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>> {
        if self.windows.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            }
            .into());
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .windows
            .iter()
            .map(|window| SearchHit {
                window,
                score: cosine_similarity(query, &window.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        Ok(hits)
    }

    /// Embedding model the index was built with.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embedding dimension (0 for an empty index).
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Build time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// All windows in insertion order.
    #[must_use]
    pub fn windows(&self) -> &[IndexedWindow] {
        &self.windows
    }

    /// Number of windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether the index holds no windows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Cosine similarity; 0.0 for empty, mismatched or zero vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
