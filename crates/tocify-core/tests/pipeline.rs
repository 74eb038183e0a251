//! End-to-end pipeline scenarios driven through in-memory collaborators.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use tocify_core::backend::{BackendError, OutlineStore, SourceOpener, StaticSource, TextSource};
use tocify_core::ocr::{OcrEngine, OcrError, OcrOutcome};
use tocify_core::{
    Collaborators, ExtractionMode, ProcessOptions, TocEntry, process_document, verify_outline,
};

/// Opener that hands out the same in-memory document for every path.
struct FakeOpener {
    doc: StaticSource,
}

impl SourceOpener for FakeOpener {
    fn open(&self, _path: &Path) -> Result<Box<dyn TextSource>, BackendError> {
        Ok(Box::new(self.doc.clone()))
    }
}

/// Outline store that serves a fixed existing outline and records writes.
#[derive(Default)]
struct RecordingStore {
    existing: Vec<TocEntry>,
    written: RefCell<Option<(PathBuf, PathBuf, Vec<TocEntry>)>>,
}

impl OutlineStore for RecordingStore {
    fn read_outline(&self, _path: &Path) -> Result<Vec<TocEntry>, BackendError> {
        Ok(self.existing.clone())
    }

    fn write_outline(
        &self,
        source: &Path,
        dest: &Path,
        entries: &[TocEntry],
    ) -> Result<(), BackendError> {
        *self.written.borrow_mut() =
            Some((source.to_path_buf(), dest.to_path_buf(), entries.to_vec()));
        Ok(())
    }
}

impl RecordingStore {
    fn written_entries(&self) -> Vec<TocEntry> {
        self.written
            .borrow()
            .as_ref()
            .expect("outline was never written")
            .2
            .clone()
    }
}

/// OCR engine that only records whether it was invoked.
#[derive(Default)]
struct FakeOcr {
    invoked: Cell<bool>,
    fail: bool,
}

impl OcrEngine for FakeOcr {
    fn run(&self, _source: &Path, _dest: &Path) -> Result<OcrOutcome, OcrError> {
        self.invoked.set(true);
        if self.fail {
            Err(OcrError::Failed {
                status: 1,
                stderr: "simulated failure".into(),
            })
        } else {
            Ok(OcrOutcome::Completed)
        }
    }
}

fn run(
    doc: StaticSource,
    store: &RecordingStore,
    ocr: &FakeOcr,
    options: &ProcessOptions,
) -> tocify_core::PipelineReport {
    let opener = FakeOpener { doc };
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    std::fs::write(&source, b"%PDF-stub").unwrap();

    let collab = Collaborators {
        opener: &opener,
        outlines: store,
        ocr,
    };
    process_document(&source, &output, options, &collab).unwrap()
}

/// A document whose ToC page yields two chapter entries at pages 5 and 20.
fn chaptered_doc() -> StaticSource {
    let mut pages: Vec<String> = (0..30).map(|i| format!("body text page {}", i)).collect();
    pages[1] = concat!(
        "Table of Contents\n",
        "Chapter 1: Introduction ..... 5\n",
        "Chapter 2: Methods ..... 20\n",
    )
    .to_string();
    // Enough text that the classifier sees an OCR'd document.
    pages[0] = "This opening page carries plenty of extractable text for the classifier to find."
        .to_string();
    StaticSource::new(pages)
}

#[test]
fn scenario_toc_page_document() {
    let store = RecordingStore::default();
    let ocr = FakeOcr::default();
    let report = run(chaptered_doc(), &store, &ocr, &ProcessOptions::default());

    assert!(!report.kept_existing);
    assert_eq!(report.entries_written, 2);

    let written = store.written_entries();
    assert_eq!(written.len(), 2);
    // Chapter entries come out of the extractor at level 2; normalization
    // shifts the whole outline up to start at level 1.
    assert_eq!(written[0].level, 1);
    assert_eq!(written[0].title, "Chapter 1: Introduction");
    assert_eq!(written[0].page, 5);
    assert_eq!(written[1].page, 20);
}

#[test]
fn scenario_textless_document_with_skip_ocr() {
    // No text at all, no ToC: with skip_ocr the pipeline must not invoke
    // OCR and still succeed with an empty outline.
    let doc = StaticSource::repeated("", 8);
    let store = RecordingStore::default();
    let ocr = FakeOcr::default();
    let options = ProcessOptions {
        skip_ocr: true,
        ..ProcessOptions::default()
    };
    let report = run(doc, &store, &ocr, &options);

    assert!(!ocr.invoked.get(), "OCR must not run with skip_ocr");
    assert!(!report.ocr_applied);
    assert_eq!(report.entries_written, 0);
    assert!(store.written_entries().is_empty());
}

#[test]
fn scenario_degenerate_existing_outline_triggers_regeneration() {
    // Two level-1 entries both pointing at physical page 1 in a 50-page
    // document: flagged invalid, then regenerated from the ToC page.
    let mut pages: Vec<String> = (0..50).map(|i| format!("page {} body", i)).collect();
    pages[0] =
        "A cover page with a generous amount of text so the classifier is satisfied.".to_string();
    pages[2] = "Contents\nChapter 1: Opening Remarks ..... 5\nChapter 2: Closing Remarks ..... 30"
        .to_string();
    let doc = StaticSource::new(pages);

    let existing = vec![
        TocEntry::new(1, "Untitled", 1),
        TocEntry::new(1, "Untitled Again", 1),
    ];
    let verification = verify_outline(&doc, &existing).unwrap();
    assert!(!verification.is_valid);
    assert!(
        verification
            .issues
            .iter()
            .any(|i| i.contains("lack structure"))
    );

    let store = RecordingStore {
        existing,
        ..RecordingStore::default()
    };
    let ocr = FakeOcr::default();
    let report = run(doc, &store, &ocr, &ProcessOptions::default());

    assert!(!report.kept_existing);
    assert_eq!(report.entries_written, 2);
    assert_eq!(store.written_entries()[0].title, "Chapter 1: Opening Remarks");
}

#[test]
fn valid_existing_outline_short_circuits() {
    // Headings really do sit on their pages, so verification passes and the
    // source is copied without extraction.
    let mut pages: Vec<String> = (0..30).map(|i| format!("page {} body", i)).collect();
    pages[0] = "Cover page with plenty of text for the availability classifier to count."
        .to_string();
    pages[4] = "Introduction and Motivation\nbody".to_string();
    pages[19] = "Evaluation Methodology Details\nbody".to_string();
    pages[24] = "Concluding Remarks Overall\nbody".to_string();
    let doc = StaticSource::new(pages);

    let store = RecordingStore {
        existing: vec![
            TocEntry::new(1, "Introduction and Motivation", 5),
            TocEntry::new(1, "Evaluation Methodology Details", 20),
            TocEntry::new(1, "Concluding Remarks Overall", 25),
        ],
        ..RecordingStore::default()
    };
    let ocr = FakeOcr::default();

    let opener = FakeOpener { doc };
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    std::fs::write(&source, b"%PDF-original-bytes").unwrap();

    let collab = Collaborators {
        opener: &opener,
        outlines: &store,
        ocr: &ocr,
    };
    let report =
        process_document(&source, &output, &ProcessOptions::default(), &collab).unwrap();

    assert!(report.kept_existing);
    assert!(store.written.borrow().is_none(), "no outline write expected");
    // The source document is copied through unchanged.
    assert_eq!(std::fs::read(&output).unwrap(), b"%PDF-original-bytes");
}

#[test]
fn no_fix_keeps_broken_outline() {
    let doc = StaticSource::repeated("body text on every page of this document here", 50);
    let store = RecordingStore {
        existing: vec![TocEntry::new(1, "Broken", 1)],
        ..RecordingStore::default()
    };
    let ocr = FakeOcr::default();
    let options = ProcessOptions {
        repair_outline: false,
        ..ProcessOptions::default()
    };
    let report = run(doc, &store, &ocr, &options);

    assert!(report.kept_existing);
    assert!(store.written.borrow().is_none());
}

#[test]
fn ocr_failure_degrades_to_original_document() {
    let doc = chaptered_doc();
    let store = RecordingStore::default();
    let ocr = FakeOcr {
        fail: true,
        ..FakeOcr::default()
    };
    let options = ProcessOptions {
        force_ocr: true,
        ..ProcessOptions::default()
    };
    let report = run(doc, &store, &ocr, &options);

    assert!(ocr.invoked.get());
    assert!(!report.ocr_applied, "failed OCR must not count as applied");
    // Extraction still happened on the original document.
    assert_eq!(report.entries_written, 2);
}

#[test]
fn skip_ocr_wins_over_force_ocr() {
    let doc = chaptered_doc();
    let store = RecordingStore::default();
    let ocr = FakeOcr::default();
    let options = ProcessOptions {
        skip_ocr: true,
        force_ocr: true,
        ..ProcessOptions::default()
    };
    run(doc, &store, &ocr, &options);
    assert!(!ocr.invoked.get());
}

#[test]
fn auto_mode_falls_back_to_section_headers() {
    // No ToC page, but numbered headings in the body.
    let mut pages: Vec<String> = vec![
        "An opening page that carries more than enough text for the classifier.".to_string(),
        "1. Introduction\nprose follows".to_string(),
        "2. Methods\nprose follows".to_string(),
    ];
    pages.push("3. Results\nprose follows".to_string());
    let doc = StaticSource::new(pages);

    let store = RecordingStore::default();
    let ocr = FakeOcr::default();
    let report = run(doc, &store, &ocr, &ProcessOptions::default());

    assert_eq!(report.entries_written, 3);
    let written = store.written_entries();
    assert_eq!(written[0].title, "1. Introduction");
    assert_eq!(written[0].page, 2);
}

#[test]
fn toc_page_mode_does_not_fall_back() {
    let doc = StaticSource::from_pages(&[
        "Enough text on this page to satisfy the availability classifier easily.",
        "1. Introduction\nprose",
    ]);
    let store = RecordingStore::default();
    let ocr = FakeOcr::default();
    let options = ProcessOptions {
        mode: ExtractionMode::TocPage,
        ..ProcessOptions::default()
    };
    let report = run(doc, &store, &ocr, &options);
    assert_eq!(report.entries_written, 0);
}

#[test]
fn pages_clamped_to_document_bounds() {
    // Printed pages run past the physical end; written pages must be
    // clamped into [1, page_count].
    let mut pages: Vec<String> = (0..10).map(|i| format!("page {} body", i)).collect();
    pages[0] = "Opening page with sufficient text for the availability classifier.".to_string();
    pages[1] = "Contents\nChapter 1: Beginning Material ..... 3\nChapter 2: Final Material ..... 55"
        .to_string();
    let doc = StaticSource::new(pages);

    let store = RecordingStore::default();
    let ocr = FakeOcr::default();
    let report = run(doc, &store, &ocr, &ProcessOptions::default());
    assert_eq!(report.page_offset, 0);

    let written = store.written_entries();
    assert_eq!(written.len(), 2);
    assert!(written.iter().all(|e| (1..=10).contains(&e.page)));
}

#[test]
fn written_outline_has_no_duplicates() {
    let mut pages: Vec<String> = (0..25).map(|i| format!("page {} body", i)).collect();
    pages[0] = "A front page holding a comfortable amount of extractable text.".to_string();
    pages[1] = "Contents\n1. Repeated Title ..... 5\n1. Repeated Title ..... 5\n2. Other ..... 9"
        .to_string();
    let doc = StaticSource::new(pages);

    let store = RecordingStore::default();
    let ocr = FakeOcr::default();
    run(doc, &store, &ocr, &ProcessOptions::default());

    let written = store.written_entries();
    let mut keys: Vec<(String, usize)> = written
        .iter()
        .map(|e| (e.title.to_lowercase(), e.page))
        .collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), written.len());
}
