//! Vector index persistence.
//!
//! The index is stored as a single JSON document inside the index directory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::write_atomic;
use crate::error::StorageError;
use crate::index::VectorIndex;
use crate::Result;

/// File name of the serialized index inside the index directory.
pub const ARTIFACT_FILE: &str = "index.json";

/// Format version written into every artifact.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    version: u32,
    index: &'a VectorIndex,
}

#[derive(Deserialize)]
struct Artifact {
    version: u32,
    index: VectorIndex,
}

/// Whether a persisted index exists in `dir`.
#[must_use]
pub fn artifact_exists(dir: &Path) -> bool {
    dir.join(ARTIFACT_FILE).is_file()
}

/// Persist `index` into `dir`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_index(dir: &Path, index: &VectorIndex) -> Result<()> {
    let artifact = ArtifactRef {
        version: ARTIFACT_VERSION,
        index,
    };
    let bytes = serde_json::to_vec(&artifact).map_err(StorageError::from)?;
    let path = dir.join(ARTIFACT_FILE);

    write_atomic(&path, &bytes)?;

    tracing::info!(
        path = %path.display(),
        windows = index.len(),
        bytes = bytes.len(),
        "Vector index saved"
    );
    Ok(())
}

/// Load the index persisted in `dir`, if any.
///
/// # Errors
///
/// Returns an error if the artifact exists but cannot be read, decoded, or
/// has an unsupported version.
pub fn load_index(dir: &Path) -> Result<Option<VectorIndex>> {
    let path = dir.join(ARTIFACT_FILE);

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let corrupt = |reason: String| StorageError::Corrupt {
        path: path.display().to_string(),
        reason,
    };

    let artifact: Artifact = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;

    if artifact.version != ARTIFACT_VERSION {
        return Err(corrupt(format!(
            "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
            artifact.version
        ))
        .into());
    }

    tracing::info!(
        path = %path.display(),
        windows = artifact.index.len(),
        "Loaded existing vector index"
    );

    Ok(Some(artifact.index))
}
