//! Index construction: load documents, chunk, embed, persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::chunker::{Chunker, TextWindow};
use super::loader::DocumentLoader;
use super::vector::{IndexedWindow, VectorIndex};
use crate::embeddings::EmbeddingProvider;
use crate::error::IndexError;
use crate::scanner::ChangeDetector;
use crate::storage::{artifact_exists, load_index, save_index};
use crate::{Error, Result};

/// How an index handle was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    /// Reused the persisted artifact.
    Loaded,
    /// Built from the documents on disk.
    Rebuilt,
}

/// A freshly obtained index.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The new index handle.
    pub index: Arc<VectorIndex>,
    /// Whether it was loaded or rebuilt.
    pub kind: BuildKind,
    /// Documents read (0 when loaded).
    pub documents: usize,
}

/// Builds vector indexes from a documents directory.
pub struct IndexBuilder {
    detector: ChangeDetector,
    index_dir: PathBuf,
    chunker: Chunker,
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexBuilder {
    /// Create a builder reading documents from `docs_dir` and persisting the
    /// index under `index_dir`.
    pub fn new(
        docs_dir: impl Into<PathBuf>,
        index_dir: impl Into<PathBuf>,
        chunker: Chunker,
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            detector: ChangeDetector::new(docs_dir),
            index_dir: index_dir.into(),
            chunker,
            loader,
            embedder,
        }
    }

    /// Detector over the documents directory.
    #[must_use]
    pub const fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// Directory holding the persisted index.
    #[must_use]
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Embedding provider used for documents and queries.
    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Reuse the persisted index when nothing changed, otherwise rebuild.
    ///
    /// An artifact written by a different embedding model, or one that
    /// cannot be decoded, is rebuilt.
    ///
    /// # Errors
    ///
    /// Returns an error if a rebuild is needed and fails.
    pub async fn build_or_load(&self, changed: bool) -> Result<BuildOutput> {
        if !changed && artifact_exists(&self.index_dir) {
            let dir = self.index_dir.clone();
            let loaded = tokio::task::spawn_blocking(move || load_index(&dir))
                .await
                .map_err(|e| Error::internal(format!("index load task failed: {e}")))?;

            match loaded {
                Ok(Some(index)) if index.model() == self.embedder.model_name() => {
                    tracing::info!(
                        windows = index.len(),
                        model = index.model(),
                        "Loaded persisted vector index"
                    );
                    return Ok(BuildOutput {
                        index: Arc::new(index),
                        kind: BuildKind::Loaded,
                        documents: 0,
                    });
                }
                Ok(Some(index)) => {
                    tracing::warn!(
                        persisted = index.model(),
                        current = self.embedder.model_name(),
                        "Persisted index uses another embedding model, rebuilding"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted index unusable, rebuilding");
                }
            }
        }

        self.rebuild().await
    }

    /// Build a new index from every eligible document and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if any document fails to load, embedding fails, or
    /// the index cannot be saved.
    pub async fn rebuild(&self) -> Result<BuildOutput> {
        let start = Instant::now();

        let detector = self.detector.clone();
        let loader = Arc::clone(&self.loader);
        let chunker = self.chunker.clone();
        let (windows, documents) =
            tokio::task::spawn_blocking(move || load_windows(&detector, loader.as_ref(), &chunker))
                .await
                .map_err(|e| Error::internal(format!("document load task failed: {e}")))??;

        let texts: Vec<String> = windows.iter().map(|w| w.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_documents(&texts).await?
        };

        if embeddings.len() != windows.len() {
            return Err(IndexError::EmbeddingCount {
                expected: windows.len(),
                actual: embeddings.len(),
            }
            .into());
        }

        let indexed: Vec<IndexedWindow> = windows
            .into_iter()
            .zip(embeddings)
            .map(|(w, embedding)| IndexedWindow {
                source: w.source,
                index: w.index,
                text: w.text,
                embedding,
            })
            .collect();

        let index = Arc::new(VectorIndex::new(self.embedder.model_name(), indexed)?);

        let dir = self.index_dir.clone();
        let to_save = Arc::clone(&index);
        tokio::task::spawn_blocking(move || save_index(&dir, &to_save))
            .await
            .map_err(|e| Error::internal(format!("index save task failed: {e}")))??;

        tracing::info!(
            documents,
            windows = index.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Vector index rebuilt"
        );

        Ok(BuildOutput {
            index,
            kind: BuildKind::Rebuilt,
            documents,
        })
    }
}

/// Load and chunk every eligible document under the detector's root.
fn load_windows(
    detector: &ChangeDetector,
    loader: &dyn DocumentLoader,
    chunker: &Chunker,
) -> Result<(Vec<TextWindow>, usize)> {
    let files = detector.eligible_files()?;
    let mut windows = Vec::new();

    for path in &files {
        let document = loader.load(path)?;
        let chunks = chunker.chunk_document(&document.source, &document.text);

        if chunks.is_empty() {
            tracing::warn!(path = %path.display(), "Document has no extractable text");
            continue;
        }

        tracing::debug!(path = %path.display(), windows = chunks.len(), "Document chunked");
        windows.extend(chunks);
    }

    Ok((windows, files.len()))
}
