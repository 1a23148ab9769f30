//! Document eligibility by file name.

use std::path::Path;

/// Extensions indexed by default.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Case-insensitive file-name extension filter.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    suffixes: Vec<String>,
}

impl DocumentFilter {
    /// Create a filter accepting the given extensions (without the dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = extensions
            .into_iter()
            .map(|ext| format!(".{}", ext.as_ref().trim_start_matches('.').to_lowercase()))
            .collect();
        Self { suffixes }
    }

    /// Filter accepting PDF documents only.
    #[must_use]
    pub fn pdf() -> Self {
        Self::new(DOCUMENT_EXTENSIONS)
    }

    /// Check whether `path` names an eligible document.
    ///
    /// Only the file name is inspected, so `REPORT.PDF` and `notes.Pdf`
    /// match while `archive.pdf.zip` does not.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy().to_lowercase();
        self.suffixes.iter().any(|suffix| name.ends_with(suffix))
    }
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self::pdf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_filter_case_insensitive() {
        let filter = DocumentFilter::pdf();
        assert!(filter.matches(Path::new("/docs/a.pdf")));
        assert!(filter.matches(Path::new("/docs/REPORT.PDF")));
        assert!(filter.matches(Path::new("/docs/sub/notes.Pdf")));
    }

    #[test]
    fn test_pdf_filter_rejects_other_files() {
        let filter = DocumentFilter::pdf();
        assert!(!filter.matches(Path::new("/docs/a.txt")));
        assert!(!filter.matches(Path::new("/docs/archive.pdf.zip")));
        assert!(!filter.matches(Path::new("/docs/pdf")));
        assert!(!filter.matches(Path::new("/")));
    }

    #[test]
    fn test_custom_extensions() {
        let filter = DocumentFilter::new([".PDF", "txt"]);
        assert!(filter.matches(Path::new("a.pdf")));
        assert!(filter.matches(Path::new("b.TXT")));
        assert!(!filter.matches(Path::new("c.md")));
    }
}
