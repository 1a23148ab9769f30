//! Persisted path → content digest mapping.
//!
//! Loaded once at startup and committed after every successful rebuild.
//! Entries are only ever added or overwritten; files removed from disk keep
//! their digest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::write_atomic;
use crate::error::StorageError;
use crate::Result;

/// Mapping from file path to hex digest.
pub type DigestMap = BTreeMap<String, String>;

/// Digest store backed by a JSON file.
#[derive(Debug)]
pub struct HashStore {
    path: PathBuf,
    digests: RwLock<DigestMap>,
}

impl HashStore {
    /// Create an empty store that will persist to `path`.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            digests: RwLock::new(DigestMap::new()),
        }
    }

    /// Load the store from `path`. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let digests = match std::fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice::<DigestMap>(&bytes).map_err(|e| StorageError::Corrupt {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DigestMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), count = digests.len(), "Loaded file hashes");

        Ok(Self {
            path,
            digests: RwLock::new(digests),
        })
    }

    /// Persist the mapping with `updates` applied, then apply them in memory.
    /// Entries are inserted or overwritten; entries not in `updates` are kept.
    ///
    /// The in-memory mapping is left untouched when the write fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn commit(&self, updates: DigestMap) -> Result<()> {
        let mut merged = self.snapshot();
        merged.extend(updates);
        self.write(&merged)?;
        *self.digests.write() = merged;
        Ok(())
    }

    fn write(&self, digests: &DigestMap) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(digests).map_err(StorageError::from)?;
        write_atomic(&self.path, &bytes)?;

        tracing::info!(path = %self.path.display(), count = digests.len(), "Saved file hashes");
        Ok(())
    }

    /// Copy of the current mapping.
    #[must_use]
    pub fn snapshot(&self) -> DigestMap {
        self.digests.read().clone()
    }

    /// Digest recorded for `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<String> {
        self.digests.read().get(path).cloned()
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.read().len()
    }

    /// Whether no file is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.read().is_empty()
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
