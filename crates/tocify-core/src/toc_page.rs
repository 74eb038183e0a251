//! Extracts ToC entries from a document's dedicated table-of-contents pages.
//!
//! Two textual grammars are tried in order:
//! 1. Dotted leader lines: `Chapter 1: Title ........ 15`
//! 2. Line triplets, where number, title, and page land on separate lines
//!    (common after text extraction of multi-column ToC layouts).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::backend::{BackendError, TextSource};
use crate::{TocEntry, sort_entries};

/// How far past the physical page count a printed page number may point.
/// Front matter routinely shifts printed numbers well below the physical
/// index, so the tolerance only needs to be generous in one direction.
const PAGE_NUMBER_SLACK: usize = 50;

/// Pages searched for ToC markers, from the front of the document.
const TOC_SEARCH_PAGES: usize = 15;

/// Minimum count of bare-integer lines for a page to qualify as a ToC page
/// on column-shape alone.
const NUMBER_COLUMN_THRESHOLD: usize = 5;

/// Locate table-of-contents pages and parse them into entries.
///
/// Returns an empty list when no ToC page is detected or neither grammar
/// matches; the caller decides whether to fall back to another extractor.
pub fn extract_toc_from_pages(doc: &dyn TextSource) -> Result<Vec<TocEntry>, BackendError> {
    static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

    const TOC_MARKERS: &[&str] = &[
        "contents",
        "table of contents",
        "inhaltsverzeichnis",
        "índice",
        "sommaire",
    ];

    let total_pages = doc.page_count();
    let mut toc_text = String::new();
    let mut toc_pages = 0usize;

    for i in 0..TOC_SEARCH_PAGES.min(total_pages) {
        let text = doc.page_text(i)?;
        let lower = text.to_lowercase();

        let mut is_toc_page = TOC_MARKERS.iter().any(|m| lower.contains(m));

        // A column of bare page numbers is an equally strong signal.
        if !is_toc_page {
            let number_lines = text
                .lines()
                .filter(|line| BARE_NUMBER.is_match(line.trim()))
                .count();
            if number_lines >= NUMBER_COLUMN_THRESHOLD {
                is_toc_page = true;
            }
        }

        if is_toc_page {
            if !toc_text.is_empty() {
                toc_text.push('\n');
            }
            toc_text.push_str(text);
            toc_pages += 1;
        }
    }

    if toc_pages == 0 {
        tracing::debug!("no ToC pages detected");
        return Ok(Vec::new());
    }
    tracing::debug!(
        chars = toc_text.len(),
        pages = toc_pages,
        "ToC text extracted"
    );

    let mut entries = parse_dotted_leaders(&toc_text, total_pages);
    if entries.is_empty() {
        tracing::debug!("no dotted leader format found, trying line-by-line format");
        entries = parse_line_triplets(&toc_text, total_pages);
    }

    sort_entries(&mut entries);
    tracing::debug!(count = entries.len(), "ToC entries found");
    Ok(entries)
}

/// Grammar 1: titles joined to page numbers by a run of leader characters.
fn parse_dotted_leaders(toc_text: &str, total_pages: usize) -> Vec<TocEntry> {
    // `Chapter 1: Title ..... 15` / `CHAPTER 1 Title ..... 15`
    static CHAPTER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^(Chapter|CHAPTER)\s+(\d+)[:\s]+(.+?)\s*[.…·\-_\s]{3,}\s*(\d+)\s*$")
            .unwrap()
    });
    // `Part I: Title ..... 5`
    static PART: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^(Part|PART)\s+([IVX\d]+)[:\s]+(.+?)\s*[.…·\-_\s]{3,}\s*(\d+)\s*$")
            .unwrap()
    });
    // `1.1.1 Title ..... 15`
    static SUBSUB: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^(\d+\.\d+\.\d+)\s+(.+?)\s*[.…·\-_\s]{3,}\s*(\d+)\s*$").unwrap()
    });
    // `1.1 Title ..... 15`
    static SUB: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^(\d+\.\d+)\s+(.+?)\s*[.…·\-_\s]{3,}\s*(\d+)\s*$").unwrap()
    });
    // `1. Title ..... 15` / `1) Title ..... 15`
    static NUMBERED: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^(\d+)[.)]\s+(.+?)\s*[.…·\-_\s]{3,}\s*(\d+)\s*$").unwrap()
    });

    enum Kind {
        Chapter,
        Part,
        SubSub,
        Sub,
        Numbered,
    }

    // Fixed priority order; the shared dedup set means an earlier pattern
    // claims a line before a more general one can re-match it.
    let patterns: [(&Regex, Kind); 5] = [
        (&CHAPTER, Kind::Chapter),
        (&PART, Kind::Part),
        (&SUBSUB, Kind::SubSub),
        (&SUB, Kind::Sub),
        (&NUMBERED, Kind::Numbered),
    ];

    let mut entries: Vec<TocEntry> = Vec::new();
    let mut seen: std::collections::HashSet<(String, usize)> = std::collections::HashSet::new();

    for (regex, kind) in patterns {
        for caps in regex.captures_iter(toc_text) {
            let (title, level, page_str) = match kind {
                Kind::Chapter | Kind::Part => {
                    let prefix = &caps[1];
                    let num = &caps[2];
                    let title = format!("{} {}: {}", prefix, num, caps[3].trim());
                    let level = if matches!(kind, Kind::Part) { 1 } else { 2 };
                    (title, level, caps.get(4).unwrap().as_str())
                }
                Kind::SubSub => (
                    format!("{} {}", &caps[1], caps[2].trim()),
                    4,
                    caps.get(3).unwrap().as_str(),
                ),
                Kind::Sub => (
                    format!("{} {}", &caps[1], caps[2].trim()),
                    3,
                    caps.get(3).unwrap().as_str(),
                ),
                Kind::Numbered => (
                    format!("{}. {}", &caps[1], caps[2].trim()),
                    2,
                    caps.get(3).unwrap().as_str(),
                ),
            };

            let Ok(page) = page_str.parse::<usize>() else {
                continue;
            };
            if page < 1 || page > total_pages + PAGE_NUMBER_SLACK {
                continue;
            }
            let key = (title.to_lowercase(), page);
            if !seen.insert(key) {
                continue;
            }
            entries.push(TocEntry::new(level, title, page));
        }
    }

    entries
}

/// Grammar 2: number, title, and page number on consecutive lines, e.g.
///
/// ```text
/// 1
/// A whirlwind history
/// 1
/// I
/// Core Concepts
/// 7
/// ```
fn parse_line_triplets(toc_text: &str, total_pages: usize) -> Vec<TocEntry> {
    // Header/footer noise dropped before scanning.
    static NOISE: Lazy<Vec<Regex>> = Lazy::new(|| {
        vec![
            Regex::new(r"(?i)^contents?$").unwrap(),
            Regex::new(r"(?i)^table of contents$").unwrap(),
            // Date lines like "February 2, 2010"
            Regex::new(r"(?i)^\w+\s+\d+,\s+\d{4}$").unwrap(),
        ]
    });

    let lines: Vec<&str> = toc_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut entries: Vec<TocEntry> = Vec::new();
    let mut i = 0usize;
    while i < lines.len() {
        if NOISE.iter().any(|re| re.is_match(lines[i])) {
            i += 1;
            continue;
        }

        match try_parse_triplet(&lines, i, total_pages) {
            Some((entry, consumed)) => {
                entries.push(entry);
                i += consumed;
            }
            None => i += 1,
        }
    }

    // Deduplicate, keeping first occurrence.
    let mut seen: std::collections::HashSet<(String, usize)> = std::collections::HashSet::new();
    entries.retain(|e| seen.insert(e.dedup_key()));
    entries
}

/// Try the four line-sequence shapes at `idx`. On success returns the entry
/// and the number of lines consumed; the caller otherwise advances one line.
fn try_parse_triplet(
    lines: &[&str],
    idx: usize,
    total_pages: usize,
) -> Option<(TocEntry, usize)> {
    static ARABIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
    static ROMAN_ANY_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[IVXivx]+$").unwrap());
    static PART_ROMAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^([IVX]+)$").unwrap());
    static PLAIN_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z\s,\-:]+$").unwrap());
    static DOTTED_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)+)$").unwrap());

    let line = lines[idx];

    // Shape A: chapter number / title / page.
    if ARABIC.is_match(line) && idx + 2 < lines.len() {
        let title_line = lines[idx + 1];
        let page_line = lines[idx + 2];
        if !ARABIC.is_match(title_line) && !ROMAN_ANY_CASE.is_match(title_line) {
            if let Some(page) = parse_page_number(page_line, total_pages) {
                let title = format!("{}. {}", line, title_line);
                return Some((TocEntry::new(2, title, page), 3));
            }
        }
    }

    // Shape B: part roman numeral / title / page.
    if let Some(caps) = PART_ROMAN.captures(line) {
        if idx + 2 < lines.len() {
            let title_line = lines[idx + 1];
            let page_line = lines[idx + 2];
            if !ARABIC.is_match(title_line) && !ROMAN_ANY_CASE.is_match(title_line) {
                if let Some(page) = parse_page_number(page_line, total_pages) {
                    let title = format!("Part {}: {}", caps[1].to_uppercase(), title_line);
                    return Some((TocEntry::new(1, title, page), 3));
                }
            }
        }
    }

    // Shape C: bare title / page (entries like "Preface" / "ix"). When the
    // line after the page is itself a bare number it may be the next chapter
    // number rather than part of this entry; either way only the two lines
    // belonging to this entry are consumed.
    if PLAIN_TITLE.is_match(line) && idx + 1 < lines.len() {
        if let Some(page) = parse_page_number(lines[idx + 1], total_pages) {
            return Some((TocEntry::new(2, line.to_string(), page), 2));
        }
    }

    // Shape D: dotted section number / title / page.
    if let Some(caps) = DOTTED_NUMBER.captures(line) {
        if idx + 2 < lines.len() {
            let number = &caps[1];
            let title_line = lines[idx + 1];
            let page_line = lines[idx + 2];
            if !ARABIC.is_match(title_line) {
                if let Some(page) = parse_page_number(page_line, total_pages) {
                    let level = number.matches('.').count() + 2;
                    let title = format!("{} {}", number, title_line);
                    return Some((TocEntry::new(level, title, page), 3));
                }
            }
        }
    }

    None
}

/// Parse a page token: an arabic integer within range, or a lowercase roman
/// numeral (front-matter pages) mapped i→1 … xx→20.
fn parse_page_number(token: &str, total_pages: usize) -> Option<usize> {
    static ARABIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

    const ROMAN: &[&str] = &[
        "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii", "xiii", "xiv",
        "xv", "xvi", "xvii", "xviii", "xix", "xx",
    ];

    let token = token.trim().to_lowercase();

    if ARABIC.is_match(&token) {
        let num: usize = token.parse().ok()?;
        if (1..=total_pages + PAGE_NUMBER_SLACK).contains(&num) {
            return Some(num);
        }
        return None;
    }

    ROMAN.iter().position(|r| *r == token).map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticSource;

    #[test]
    fn detects_toc_page_by_marker() {
        let doc = StaticSource::from_pages(&[
            "Title page",
            "Table of Contents\nChapter 1: Introduction ........ 5\nChapter 2: Methods ........ 20",
        ]);
        let entries = extract_toc_from_pages(&doc).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Chapter 1: Introduction");
        assert_eq!(entries[0].page, 5);
        assert_eq!(entries[0].level, 2);
        assert_eq!(entries[1].page, 20);
    }

    #[test]
    fn detects_toc_page_by_number_column() {
        let doc = StaticSource::from_pages(&[
            "no markers here",
            "1. First ....... 3\n3\n7\n12\n19\n25\nmore text",
        ]);
        // Five bare-number lines qualify the page even without a marker.
        let entries = extract_toc_from_pages(&doc).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "1. First");
    }

    #[test]
    fn no_toc_page_returns_empty() {
        let doc = StaticSource::from_pages(&["plain prose", "more prose"]);
        assert!(extract_toc_from_pages(&doc).unwrap().is_empty());
    }

    #[test]
    fn dotted_leader_levels() {
        let text = concat!(
            "Contents\n",
            "Part I: Foundations .......... 1\n",
            "Chapter 1: Getting Started .......... 3\n",
            "1.1 Setup .......... 4\n",
            "1.1.1 Requirements .......... 5\n",
            "2) Standalone .......... 9\n",
        );
        let entries = parse_dotted_leaders(text, 100);
        let levels: Vec<(usize, &str)> = entries
            .iter()
            .map(|e| (e.level, e.title.as_str()))
            .collect();
        assert!(levels.contains(&(1, "Part I: Foundations")));
        assert!(levels.contains(&(2, "Chapter 1: Getting Started")));
        assert!(levels.contains(&(3, "1.1 Setup")));
        assert!(levels.contains(&(4, "1.1.1 Requirements")));
        assert!(levels.contains(&(2, "2. Standalone")));
    }

    #[test]
    fn dotted_leader_rejects_out_of_range_pages() {
        let text = "Contents\n1. Way Past The End .......... 900\n";
        let entries = parse_dotted_leaders(text, 100);
        assert!(entries.is_empty());
    }

    #[test]
    fn dotted_leader_accepts_front_matter_slack() {
        // Printed page numbers may exceed the physical count by up to 50.
        let text = "Contents\n1. Late Chapter Title .......... 140\n";
        let entries = parse_dotted_leaders(text, 100);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].page, 140);
    }

    #[test]
    fn dotted_leader_dedups_across_patterns() {
        let text = "Contents\n1.1 Setup .......... 4\n1.1 Setup .......... 4\n";
        let entries = parse_dotted_leaders(text, 100);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn triplet_grammar_fires_when_leaders_absent() {
        let doc = StaticSource::from_pages(&[
            "Contents\n1\nA whirlwind history\n1\nI\nCore Concepts\n7\nPreface\nix",
        ]);
        let entries = extract_toc_from_pages(&doc).unwrap();
        assert!(!entries.is_empty());
        assert!(
            entries
                .iter()
                .any(|e| e.title == "1. A whirlwind history" && e.page == 1 && e.level == 2)
        );
        assert!(
            entries
                .iter()
                .any(|e| e.title == "Part I: Core Concepts" && e.page == 7 && e.level == 1)
        );
        assert!(entries.iter().any(|e| e.title == "Preface" && e.page == 9));
    }

    #[test]
    fn triplet_subsection_level_from_dots() {
        let lines = vec!["1.2.3", "Deep Dive", "42"];
        let (entry, consumed) = try_parse_triplet(&lines, 0, 100).unwrap();
        assert_eq!(entry.level, 4);
        assert_eq!(entry.title, "1.2.3 Deep Dive");
        assert_eq!(consumed, 3);
    }

    #[test]
    fn triplet_rejects_numeric_title_line() {
        // "1" followed by "2" is a page-number column, not an entry.
        let lines = vec!["1", "2", "3"];
        assert!(try_parse_triplet(&lines, 0, 100).is_none());
    }

    #[test]
    fn triplet_skips_date_noise() {
        let text = "Contents\nFebruary 2, 2010\n1\nHistory of Computing\n5\n";
        let entries = parse_line_triplets(text, 100);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "1. History of Computing");
    }

    #[test]
    fn roman_page_tokens_map_to_numbers() {
        assert_eq!(parse_page_number("ix", 100), Some(9));
        assert_eq!(parse_page_number("xx", 100), Some(20));
        assert_eq!(parse_page_number("42", 100), Some(42));
        assert_eq!(parse_page_number("0", 100), None);
        assert_eq!(parse_page_number("999", 100), None);
        assert_eq!(parse_page_number("xyz", 100), None);
    }

    #[test]
    fn entries_sorted_by_page_then_level() {
        let doc = StaticSource::from_pages(&[
            "Contents\nChapter 2: Later .......... 20\nChapter 1: Earlier .......... 5\nPart I: Opening .......... 5",
        ]);
        let entries = extract_toc_from_pages(&doc).unwrap();
        assert_eq!(entries[0].title, "Part I: Opening");
        assert_eq!(entries[1].title, "Chapter 1: Earlier");
        assert_eq!(entries[2].title, "Chapter 2: Later");
    }
}
