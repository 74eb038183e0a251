//! End-to-end processing pipeline.
//!
//! `CheckExisting → (valid: copy & done) | (invalid/missing: DecideOCR →
//! [OCR] → Extract(mode) → Normalize → ResolveOffset → WriteOutline)`.
//!
//! Every stage is synchronous and runs to completion before the next; the
//! document handle for each phase is opened at its start and dropped before
//! the next phase begins.

use std::path::Path;

use thiserror::Error;

use crate::backend::{BackendError, OutlineStore, SourceOpener};
use crate::ocr::{OcrEngine, OcrOutcome, has_extractable_text};
use crate::{
    ExtractionMode, TocEntry, extract_section_headers, extract_toc_from_pages, normalize_levels,
    resolve_page_offset, verify_outline,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options controlling a single pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Never run OCR, even when the document has no text. Wins over
    /// `force_ocr`.
    pub skip_ocr: bool,
    /// Run OCR even when the document appears to have text.
    pub force_ocr: bool,
    pub mode: ExtractionMode,
    /// When false, any existing outline is kept verbatim without
    /// verification.
    pub repair_outline: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            skip_ocr: false,
            force_ocr: false,
            mode: ExtractionMode::Auto,
            repair_outline: true,
        }
    }
}

/// External collaborators wired in by the caller.
pub struct Collaborators<'a> {
    pub opener: &'a dyn SourceOpener,
    pub outlines: &'a dyn OutlineStore,
    pub ocr: &'a dyn OcrEngine,
}

/// What a pipeline run did, for caller-facing summaries.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// The existing outline was kept and the document copied unchanged.
    pub kept_existing: bool,
    /// OCR ran and the OCR'd document was used for extraction and output.
    pub ocr_applied: bool,
    pub entries_written: usize,
    pub page_offset: i64,
}

/// Run the full pipeline: reconcile or regenerate the outline of `source`
/// and persist the result to `output`.
///
/// An empty extraction result is a warning, not an error: the outline is
/// written empty and the run still succeeds.
pub fn process_document(
    source: &Path,
    output: &Path,
    options: &ProcessOptions,
    collab: &Collaborators<'_>,
) -> Result<PipelineReport, PipelineError> {
    // Phase 1: if the document already carries a usable outline, keep it.
    let existing = collab.outlines.read_outline(source)?;
    if !existing.is_empty() {
        if !options.repair_outline {
            tracing::info!(
                count = existing.len(),
                "keeping existing outline (repair disabled)"
            );
            std::fs::copy(source, output)?;
            return Ok(PipelineReport {
                kept_existing: true,
                ..PipelineReport::default()
            });
        }

        let doc = collab.opener.open(source)?;
        let verification = verify_outline(doc.as_ref(), &existing)?;
        drop(doc);

        if verification.is_valid {
            tracing::info!(count = existing.len(), "existing outline is valid");
            std::fs::copy(source, output)?;
            return Ok(PipelineReport {
                kept_existing: true,
                ..PipelineReport::default()
            });
        }
        for issue in &verification.issues {
            tracing::warn!(%issue, "existing outline rejected");
        }
    }

    // Phase 2: decide whether OCR is needed.
    let has_text = {
        let doc = collab.opener.open(source)?;
        has_extractable_text(doc.as_ref())?
    };
    let needs_ocr = if options.skip_ocr {
        false
    } else {
        options.force_ocr || !has_text
    };
    tracing::debug!(has_text, needs_ocr, "OCR decision");

    // Phase 3: run OCR, degrading to the original document on failure.
    let mut ocr_applied = false;
    let mut ocr_output: Option<tempfile::NamedTempFile> = None;
    if needs_ocr {
        tracing::info!("running OCR (this may take a while)");
        let tmp = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        match collab.ocr.run(source, tmp.path()) {
            Ok(OcrOutcome::Completed) | Ok(OcrOutcome::AlreadyHadText) => {
                ocr_applied = true;
                ocr_output = Some(tmp);
            }
            Err(e) => {
                tracing::warn!(error = %e, "OCR failed, continuing with original document");
            }
        }
    }
    let working: &Path = ocr_output.as_ref().map_or(source, |t| t.path());

    // Phase 4: extract, normalize, resolve offset, write.
    let doc = collab.opener.open(working)?;

    let entries = match options.mode {
        ExtractionMode::Auto => {
            let entries = extract_toc_from_pages(doc.as_ref())?;
            if entries.is_empty() {
                tracing::info!("no ToC page entries, falling back to section headers");
                extract_section_headers(doc.as_ref())?
            } else {
                entries
            }
        }
        ExtractionMode::TocPage => extract_toc_from_pages(doc.as_ref())?,
        ExtractionMode::SectionHeaders => extract_section_headers(doc.as_ref())?,
    };

    if entries.is_empty() {
        tracing::warn!("no table of contents entries found; writing empty outline");
    }

    let offset = resolve_page_offset(doc.as_ref(), &entries)?;
    let normalized = normalize_levels(&entries);

    let page_count = doc.page_count();
    drop(doc);

    let max_page = page_count.max(1) as i64;
    let placed: Vec<TocEntry> = normalized
        .iter()
        .map(|e| {
            let page = (e.page as i64 + offset).clamp(1, max_page) as usize;
            TocEntry::new(e.level, e.title.clone(), page)
        })
        .collect();

    collab.outlines.write_outline(working, output, &placed)?;
    tracing::info!(count = placed.len(), offset, "outline written");

    Ok(PipelineReport {
        kept_existing: false,
        ocr_applied,
        entries_written: placed.len(),
        page_offset: offset,
    })
}
