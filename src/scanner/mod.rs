//! Document discovery and change detection.
//!
//! This module provides:
//! - Case-insensitive document extension filtering
//! - Recursive directory walking
//! - Streaming content digests and comparison against recorded digests

mod detector;
mod filter;

pub use detector::{detect_changes, file_digest, ChangeDetector, ChangeSet, HASH_BLOCK_SIZE};
pub use filter::{DocumentFilter, DOCUMENT_EXTENSIONS};
