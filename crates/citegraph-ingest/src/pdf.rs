//! PDF text extraction.

use std::path::Path;

use tracing::debug;

use citegraph_core::{Error, Result};

/// Reads text out of a PDF document.
pub trait PdfReader: Send + Sync {
    /// Text of every page, joined with newlines.
    fn read(&self, path: &Path) -> Result<String>;

    /// Text of the selected pages, one string per page. Page numbers are 1-based.
    fn extract_pages(&self, path: &Path, pages: &[u32]) -> Result<Vec<String>>;
}

/// [`PdfReader`] backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfReader;

impl LopdfReader {
    pub fn new() -> Self {
        Self
    }

    fn load(path: &Path) -> Result<lopdf::Document> {
        lopdf::Document::load(path)
            .map_err(|e| Error::Pdf(format!("failed to load {}: {}", path.display(), e)))
    }

    fn page_text(doc: &lopdf::Document, page: u32) -> Result<String> {
        doc.extract_text(&[page])
            .map_err(|e| Error::Pdf(format!("page {}: {}", page, e)))
    }
}

impl PdfReader for LopdfReader {
    fn read(&self, path: &Path) -> Result<String> {
        let doc = Self::load(path)?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!("Reading {} pages from {}", pages.len(), path.display());

        let mut text = Vec::with_capacity(pages.len());
        for page in pages {
            text.push(Self::page_text(&doc, page)?);
        }
        Ok(text.join("\n"))
    }

    fn extract_pages(&self, path: &Path, pages: &[u32]) -> Result<Vec<String>> {
        let doc = Self::load(path)?;
        let available = doc.get_pages();
        debug!(
            "Extracting pages {:?} of {} from {}",
            pages,
            available.len(),
            path.display()
        );

        pages
            .iter()
            .map(|&page| {
                if !available.contains_key(&page) {
                    return Err(Error::Pdf(format!(
                        "page {} out of range (document has {} pages)",
                        page,
                        available.len()
                    )));
                }
                Self::page_text(&doc, page)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_pdf_error() {
        let dir = TempDir::new().unwrap();
        let err = LopdfReader::new().read(&dir.path().join("absent.pdf")).unwrap_err();
        assert_eq!(err.kind(), "pdf");
    }

    #[test]
    fn test_garbage_file_is_pdf_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"plain text, not a pdf").unwrap();
        let err = LopdfReader::new().extract_pages(&path, &[1]).unwrap_err();
        assert!(matches!(err, Error::Pdf(_)));
    }
}
