//! Retrieval index: document loading, chunking, embedding and search.
//!
//! This module provides:
//! - Text extraction from PDF documents
//! - Recursive character chunking into overlapping windows
//! - An immutable in-memory vector index with cosine search
//! - The builder that produces (or reloads) an index for a directory

mod builder;
mod chunker;
mod loader;
mod vector;

pub use builder::{BuildKind, BuildOutput, IndexBuilder};
pub use chunker::{Chunker, ChunkerConfig, TextWindow};
pub use loader::{DocumentLoader, LoadedDocument, PdfLoader, PlainTextLoader};
pub use vector::{cosine_similarity, IndexedWindow, SearchHit, VectorIndex};
