use std::path::Path;

use mupdf::{Document, TextPageFlags};

use tocify_core::backend::{BackendError, SourceOpener, TextSource};

/// MuPDF-based implementation of [`TextSource`].
///
/// This crate is the sole AGPL island — it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the inference engine does not transitively
/// depend on it.
///
/// All page text is extracted eagerly when the document is opened, so the
/// returned source is plain owned data with no live MuPDF state. Unlike
/// reference-extraction tooling, no header/footer region is excluded:
/// running heads and bare page-number lines are exactly the signals the
/// ToC-page detector and the page-number-artifact heuristic feed on.
pub struct MupdfSource {
    pages: Vec<String>,
}

impl MupdfSource {
    /// Open a PDF and extract the text of every page.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            // Block/line iteration to match line-preserving plain-text
            // extraction.
            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages.push(page_text);
        }

        Ok(Self { pages })
    }
}

impl TextSource for MupdfSource {
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

/// [`SourceOpener`] handing out [`MupdfSource`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfOpener;

impl SourceOpener for MupdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn TextSource>, BackendError> {
        Ok(Box::new(MupdfSource::open(path)?))
    }
}
