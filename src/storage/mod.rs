//! Persisted state under the embeddings directory.
//!
//! This module provides:
//! - The file digest mapping used for change detection
//! - The serialized vector index artifact

mod artifact;
mod hash_store;

use std::path::Path;

pub use artifact::{artifact_exists, load_index, save_index, ARTIFACT_FILE, ARTIFACT_VERSION};
pub use hash_store::{DigestMap, HashStore};

use crate::error::StorageError;
use crate::Result;

/// Write `bytes` to `path` through a sibling temp file and a rename.
///
/// Parent directories are created as needed. Readers see either the old or
/// the new content, never a truncated file.
///
/// # Errors
///
/// Returns an error if the directory, the temp file, or the rename fails.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(|e| StorageError::WriteFailed {
        path: tmp.display().to_string(),
        reason: e.to_string(),
    })?;

    std::fs::rename(&tmp, path).map_err(|e| StorageError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(())
}
