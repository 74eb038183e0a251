//! Resolves the shift between printed page numbers and physical page
//! indices.
//!
//! Front matter (cover, preface, the ToC itself) displaces printed numbers
//! from physical positions. The resolver probes candidate offsets by
//! checking whether an entry's title keywords actually occur on the page
//! the offset predicts, then takes the most frequently confirmed offset.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::TocEntry;
use crate::backend::{BackendError, TextSource};

/// Candidate offsets probed for each test entry, in order.
const OFFSET_RANGE: std::ops::Range<i64> = -20..30;

/// Number of entries used as probes.
const MAX_TEST_ENTRIES: usize = 5;

/// Determine the offset `k` such that `physical_page = printed_page + k`.
///
/// Returns 0 when no entry produces any keyword match; the caller applies
/// the offset unconditionally, so "no evidence" and "no shift" coincide.
pub fn resolve_page_offset(
    doc: &dyn TextSource,
    entries: &[TocEntry],
) -> Result<i64, BackendError> {
    static KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{5,}").unwrap());

    if entries.is_empty() {
        return Ok(0);
    }

    let excluded = toc_page_indices(doc)?;

    // Entries deep into the document carry more distinctive titles and are
    // less likely to collide with front-matter text.
    let mut test_entries: Vec<&TocEntry> = entries.iter().filter(|e| e.page > 20).collect();
    test_entries.sort_by_key(|e| e.page);
    test_entries.truncate(MAX_TEST_ENTRIES);
    if test_entries.is_empty() {
        test_entries = entries
            .iter()
            .filter(|e| e.page > 5)
            .take(MAX_TEST_ENTRIES)
            .collect();
    }

    let page_count = doc.page_count();
    let mut confirmed: Vec<i64> = Vec::new();

    for entry in test_entries {
        let words: Vec<String> = KEYWORD
            .find_iter(&entry.title)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        if words.len() < 2 {
            continue;
        }
        let required = 2.min(words.len());

        for offset in OFFSET_RANGE {
            let target = entry.page as i64 + offset - 1;
            if target < 0 || target >= page_count as i64 {
                continue;
            }
            let target = target as usize;
            if excluded.contains(&target) {
                continue;
            }

            let text = doc.page_text(target)?.to_lowercase();
            let matches = words.iter().filter(|w| text.contains(w.as_str())).count();
            if matches >= required {
                tracing::debug!(
                    title = %entry.title,
                    physical_page = target + 1,
                    printed_page = entry.page,
                    offset,
                    "offset probe matched"
                );
                confirmed.push(offset);
                break;
            }
        }
    }

    if confirmed.is_empty() {
        tracing::debug!("could not determine page offset, using 0");
        return Ok(0);
    }

    // Most common confirmed offset; on a tie the first-confirmed wins.
    let mut best = confirmed[0];
    let mut best_count = 0usize;
    for &candidate in &confirmed {
        let count = confirmed.iter().filter(|&&o| o == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }

    tracing::debug!(offset = best, "detected page offset");
    Ok(best)
}

/// Physical indices of likely ToC pages, plus their immediate neighbors.
/// These pages contain every entry's title by construction and must not be
/// allowed to confirm an offset.
fn toc_page_indices(doc: &dyn TextSource) -> Result<std::collections::HashSet<usize>, BackendError> {
    let mut indices = std::collections::HashSet::new();
    let page_count = doc.page_count();

    for i in 0..15usize.min(page_count) {
        let text = doc.page_text(i)?.to_lowercase();
        if text.contains("contents") {
            indices.insert(i);
            if i > 0 {
                indices.insert(i - 1);
            }
            if i + 1 < page_count {
                indices.insert(i + 1);
            }
            if i + 2 < page_count {
                indices.insert(i + 2);
            }
        }
    }

    Ok(indices)
}
