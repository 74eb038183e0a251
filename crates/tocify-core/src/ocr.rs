//! Text availability classification and the external OCR collaborator.
//!
//! OCR itself is a black box: a synchronous child-process invocation of
//! `ocrmypdf`, consumed only through a success/failure contract. The
//! pipeline degrades gracefully when it fails.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use crate::backend::{BackendError, TextSource};

/// Pages sampled when deciding whether a document already carries text.
const SAMPLE_PAGES: usize = 5;

/// Minimum total trimmed text length for a document to count as "has text".
/// Deliberately coarse: a scanned document with a typed cover sheet can
/// slip past, and that is an accepted trade-off.
const MIN_TEXT_CHARS: usize = 100;

/// Decide whether the document already has extractable text, or is a
/// scanned image that needs OCR first.
pub fn has_extractable_text(doc: &dyn TextSource) -> Result<bool, BackendError> {
    let mut total = 0usize;
    for i in 0..SAMPLE_PAGES.min(doc.page_count()) {
        total += doc.page_text(i)?.trim().len();
        if total > MIN_TEXT_CHARS {
            return Ok(true);
        }
    }
    Ok(total > MIN_TEXT_CHARS)
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("failed to invoke OCR tool: {0}")]
    Spawn(std::io::Error),
    #[error("OCR failed with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
}

/// Result of a successful OCR run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrOutcome {
    /// OCR produced a new text layer at the destination path.
    Completed,
    /// The tool reported the file already has text; treated as success.
    AlreadyHadText,
}

/// Synchronous OCR invocation. No cancellation, no internal timeout, no
/// retries: the call blocks until the tool finishes or the caller's
/// environment kills the process.
pub trait OcrEngine {
    fn run(&self, source: &Path, dest: &Path) -> Result<OcrOutcome, OcrError>;
}

/// Runs OCR through the `ocrmypdf` command-line tool.
#[derive(Debug, Clone)]
pub struct OcrMyPdf {
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    /// Optimization level 0–3. Levels ≥2 require jbig2enc to be installed;
    /// that prerequisite is outside this crate's control and surfaces as an
    /// ordinary OCR failure when missing.
    pub optimize: u8,
}

impl Default for OcrMyPdf {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            optimize: 1,
        }
    }
}

/// ocrmypdf exit code meaning "input already has text".
const EXIT_ALREADY_HAS_TEXT: i32 = 6;

impl OcrEngine for OcrMyPdf {
    fn run(&self, source: &Path, dest: &Path) -> Result<OcrOutcome, OcrError> {
        let mut cmd = Command::new("ocrmypdf");
        cmd.arg("--force-ocr")
            .arg("--output-type")
            .arg("pdf")
            .arg("--optimize")
            .arg(self.optimize.to_string())
            .arg("-l")
            .arg(&self.language)
            .arg(source)
            .arg(dest);

        tracing::debug!(?cmd, "running OCR");

        let output = cmd.output().map_err(OcrError::Spawn)?;
        match output.status.code() {
            Some(0) => Ok(OcrOutcome::Completed),
            Some(EXIT_ALREADY_HAS_TEXT) => Ok(OcrOutcome::AlreadyHadText),
            code => Err(OcrError::Failed {
                status: code.unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticSource;

    #[test]
    fn text_rich_document_has_text() {
        let doc = StaticSource::repeated(
            "This page contains a healthy amount of running text for the classifier.",
            3,
        );
        assert!(has_extractable_text(&doc).unwrap());
    }

    #[test]
    fn scanned_document_has_no_text() {
        let doc = StaticSource::repeated("", 20);
        assert!(!has_extractable_text(&doc).unwrap());
    }

    #[test]
    fn sparse_text_below_threshold() {
        // 5 sampled pages × 10 chars = 50 < 100.
        let doc = StaticSource::repeated("tiny  text", 20);
        assert!(!has_extractable_text(&doc).unwrap());
    }

    #[test]
    fn only_first_pages_are_sampled() {
        // Text beyond the sample window is not seen.
        let mut pages = vec![String::new(); 10];
        pages[9] = "a".repeat(500);
        let doc = StaticSource::new(pages);
        assert!(!has_extractable_text(&doc).unwrap());
    }

    #[test]
    fn whitespace_is_trimmed_before_counting() {
        let doc = StaticSource::repeated("   \n\t  \n", 5);
        assert!(!has_extractable_text(&doc).unwrap());
    }
}
