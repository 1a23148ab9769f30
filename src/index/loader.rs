//! Document text extraction.

use std::path::Path;

use crate::error::IndexError;
use crate::Result;

/// Extracted text of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// Path the text was extracted from.
    pub source: String,
    /// Plain text content.
    pub text: String,
}

/// Extracts plain text from a document file.
///
/// Implementations are called from blocking threads.
pub trait DocumentLoader: Send + Sync {
    /// Load `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load(&self, path: &Path) -> Result<LoadedDocument>;
}

/// PDF text extraction via `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let bytes = std::fs::read(path)?;
        let failed = |reason: String| IndexError::LoadFailed {
            path: path.display().to_string(),
            reason,
        };

        // pdf-extract panics on some malformed inputs.
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| failed("PDF parser panicked".to_string()))?
            .map_err(|e| failed(e.to_string()))?;

        Ok(LoadedDocument {
            source: path.to_string_lossy().into_owned(),
            text,
        })
    }
}

/// Reads files as UTF-8 text (lossy). Useful for fixtures and plain-text
/// corpora.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextLoader;

impl DocumentLoader for PlainTextLoader {
    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let bytes = std::fs::read(path)?;
        Ok(LoadedDocument {
            source: path.to_string_lossy().into_owned(),
            text: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_text_loader() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.pdf");
        std::fs::write(&path, "operating systems notes").unwrap();

        let doc = PlainTextLoader.load(&path).unwrap();
        assert_eq!(doc.text, "operating systems notes");
        assert_eq!(doc.source, path.to_string_lossy());
    }

    #[test]
    fn test_pdf_loader_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.pdf");
        std::fs::write(&path, b"not a valid pdf").unwrap();

        let err = PdfLoader.load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.pdf"));
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = PlainTextLoader.load(&tmp.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
