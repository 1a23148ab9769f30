//! Error types and Result aliases for docqa.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using docqa's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docqa operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or incomplete client request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No index or answer engine is available yet.
    #[error("not ready: {0}")]
    NotReady(String),

    /// Persisted state error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Directory scan / change detection error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// Index construction or search error.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Embedding provider error.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Generative model error.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Server/API error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors reading or writing persisted state.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A persisted file could not be decoded.
    #[error("corrupt file '{path}': {reason}")]
    Corrupt { path: String, reason: String },

    /// A persisted file could not be written.
    #[error("failed to write '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Change detection errors.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Root directory is missing or not a directory.
    #[error("cannot scan '{path}': {reason}")]
    InvalidRoot { path: String, reason: String },

    /// A file or directory entry could not be read.
    #[error("failed to read '{path}': {reason}")]
    Unreadable { path: String, reason: String },
}

/// Index build and query errors.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A document could not be loaded.
    #[error("failed to load document '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    /// Embedding dimensions disagree with the index.
    #[error("dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Provider returned a different number of vectors than requested.
    #[error("expected {expected} embeddings, got {actual}")]
    EmbeddingCount { expected: usize, actual: usize },
}

/// Embedding provider errors.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// HTTP transport error.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider response was not understood.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Generative model errors.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// HTTP transport error.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider returned no usable text.
    #[error("empty response: {0}")]
    Empty(String),
}

/// Server/API errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Request handling error.
    #[error("request error: {0}")]
    Request(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a not-ready error.
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl ScanError {
    /// Create an unreadable-entry error.
    pub fn unreadable(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Self::Unreadable {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}
