//! Content-digest change detection over a directory tree.
//!
//! Walks the root recursively, hashes every eligible document and compares
//! the digests with a previously recorded mapping. Files that disappeared
//! from disk are not reported.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use walkdir::WalkDir;

use super::filter::DocumentFilter;
use crate::error::ScanError;
use crate::storage::DigestMap;
use crate::Result;

/// Read size used while hashing.
pub const HASH_BLOCK_SIZE: usize = 8192;

/// Result of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// New digests for changed files only.
    pub updated: DigestMap,
    /// Eligible files seen during the walk.
    pub files_seen: usize,
}

impl ChangeSet {
    /// Whether at least one file is new or modified.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.updated.is_empty()
    }

    /// Paths of the changed files, sorted.
    #[must_use]
    pub fn changed_paths(&self) -> Vec<&str> {
        self.updated.keys().map(String::as_str).collect()
    }
}

/// Change detector bound to a root directory.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    root: PathBuf,
    filter: DocumentFilter,
}

impl ChangeDetector {
    /// Create a detector for `root` using the PDF filter.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_filter(root, DocumentFilter::pdf())
    }

    /// Create a detector with a custom filter.
    pub fn with_filter(root: impl Into<PathBuf>, filter: DocumentFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    /// Watched root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List eligible documents under the root, in walk order.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory or any entry cannot
    /// be read. There is no partial-skip policy.
    pub fn eligible_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(ScanError::InvalidRoot {
                path: self.root.display().to_string(),
                reason: "not a directory".to_string(),
            }
            .into());
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                ScanError::unreadable(path, e)
            })?;

            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());

            if is_file && self.filter.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Compare on-disk documents with `known` digests.
    ///
    /// # Errors
    ///
    /// Returns an error if the walk or any file read fails; a failed pass
    /// never reports "no changes".
    pub fn detect(&self, known: &DigestMap) -> Result<ChangeSet> {
        let files = self.eligible_files()?;
        let mut changes = ChangeSet {
            files_seen: files.len(),
            ..ChangeSet::default()
        };

        for path in files {
            let digest = file_digest(&path).map_err(|e| ScanError::unreadable(&path, e))?;
            let key = path.to_string_lossy().into_owned();

            if known.get(&key) != Some(&digest) {
                tracing::info!(path = %key, "New or modified document");
                changes.updated.insert(key, digest);
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            seen = changes.files_seen,
            changed = changes.updated.len(),
            "Change detection complete"
        );

        Ok(changes)
    }
}

/// Convenience wrapper: detect PDF changes under `root`.
///
/// # Errors
///
/// See [`ChangeDetector::detect`].
pub fn detect_changes(root: &Path, known: &DigestMap) -> Result<ChangeSet> {
    ChangeDetector::new(root).detect(known)
}

/// BLAKE3 digest of a file, read in [`HASH_BLOCK_SIZE`] blocks.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn file_digest(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; HASH_BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
