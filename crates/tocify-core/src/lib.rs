use serde::{Deserialize, Serialize};

pub mod backend;
pub mod normalize;
pub mod ocr;
pub mod offset;
pub mod pipeline;
pub mod section_headers;
pub mod toc_page;
pub mod verify;
pub mod vocab;

// Re-export for convenience
pub use backend::{BackendError, OutlineStore, SourceOpener, StaticSource, TextSource};
pub use normalize::normalize_levels;
pub use ocr::{OcrEngine, OcrError, OcrMyPdf, OcrOutcome, has_extractable_text};
pub use offset::resolve_page_offset;
pub use pipeline::{
    Collaborators, PipelineError, PipelineReport, ProcessOptions, process_document,
};
pub use section_headers::{ScanConfig, extract_section_headers};
pub use toc_page::extract_toc_from_pages;
pub use verify::verify_outline;
pub use vocab::Vocabulary;

/// A single table-of-contents entry.
///
/// `page` is 1-based. Extractors produce entries carrying the *logical*
/// (printed) page number; the pipeline converts to physical page indices
/// before handing entries to an [`OutlineStore`]. Entries are never mutated
/// in place; every transformation builds new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Nesting depth, 1-based. A finalized sequence starts at level 1 and
    /// never jumps by more than one level between adjacent entries.
    pub level: usize,
    pub title: String,
    pub page: usize,
}

impl TocEntry {
    pub fn new(level: usize, title: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }

    /// Dedup key: entries are considered duplicates when their lowercased
    /// title and page coincide.
    pub(crate) fn dedup_key(&self) -> (String, usize) {
        (self.title.to_lowercase(), self.page)
    }
}

/// Which extractor(s) the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// Try the ToC-page extractor first, fall back to section headers when
    /// it finds nothing.
    #[default]
    Auto,
    /// Only parse dedicated table-of-contents pages.
    TocPage,
    /// Only scan body text for section headers.
    SectionHeaders,
}

/// Outcome of inspecting a pre-existing outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub is_valid: bool,
    /// Human-readable defect descriptions, in check order.
    pub issues: Vec<String>,
}

impl VerificationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
        }
    }

    pub fn invalid(issues: Vec<String>) -> Self {
        Self {
            is_valid: false,
            issues,
        }
    }
}

/// Sort entries the way finalized outlines are ordered: by page, then level.
pub(crate) fn sort_entries(entries: &mut [TocEntry]) {
    entries.sort_by_key(|e| (e.page, e.level));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_lowercases_title() {
        let a = TocEntry::new(1, "Introduction", 5);
        let b = TocEntry::new(2, "INTRODUCTION", 5);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn sort_orders_by_page_then_level() {
        let mut entries = vec![
            TocEntry::new(2, "b", 10),
            TocEntry::new(1, "a", 10),
            TocEntry::new(3, "c", 2),
        ];
        sort_entries(&mut entries);
        assert_eq!(entries[0].title, "c");
        assert_eq!(entries[1].title, "a");
        assert_eq!(entries[2].title, "b");
    }
}
