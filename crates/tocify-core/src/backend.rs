use std::path::Path;

use thiserror::Error;

use crate::TocEntry;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("page index {0} out of range")]
    PageOutOfRange(usize),
    #[error("failed to write outline: {0}")]
    OutlineError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-page text access for an open document.
///
/// Implementors provide the low-level extraction step; all structure
/// inference (ToC-page parsing, header scanning, offset probing,
/// verification) lives in this crate and works purely on the returned
/// strings. Page indices are 0-based physical positions; the text preserves
/// line breaks.
pub trait TextSource {
    fn page_count(&self) -> usize;
    fn page_text(&self, index: usize) -> Result<&str, BackendError>;
}

/// Opens a document for text access.
///
/// The pipeline opens one handle per run and drops it before returning, so
/// implementations may hold whatever resources they need for the duration
/// of a single synchronous pass.
pub trait SourceOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn TextSource>, BackendError>;
}

/// Outline (bookmark) read/write access.
///
/// Entries use 1-based physical page indices and a level sequence already
/// normalized per [`crate::normalize_levels`]. `write_outline` must persist
/// the document to `dest` even when `entries` is empty; an empty outline is
/// a valid result, not an error.
pub trait OutlineStore {
    fn read_outline(&self, path: &Path) -> Result<Vec<TocEntry>, BackendError>;
    fn write_outline(
        &self,
        source: &Path,
        dest: &Path,
        entries: &[TocEntry],
    ) -> Result<(), BackendError>;
}

/// In-memory [`TextSource`] backed by one string per page.
///
/// Used throughout the test suite in place of a real PDF backend, and handy
/// for library users who already hold extracted text.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pages: Vec<String>,
}

impl StaticSource {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// Build from string slices, one per page.
    pub fn from_pages(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// A document of `count` pages that all share the same text.
    pub fn repeated(text: &str, count: usize) -> Self {
        Self {
            pages: vec![text.to_string(); count],
        }
    }
}

impl TextSource for StaticSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<&str, BackendError> {
        self.pages
            .get(index)
            .map(|s| s.as_str())
            .ok_or(BackendError::PageOutOfRange(index))
    }
}
