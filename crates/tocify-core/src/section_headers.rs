//! Scans body text for section headers when no usable ToC page exists.
//!
//! Section numbering alone is a weak signal: reference lists, citations,
//! and running page numbers share the same shape, so every structural
//! match is scored by a set of weighted rules (vocabulary, casing,
//! punctuation, negative patterns) and only candidates at or above the
//! acceptance threshold survive.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::backend::{BackendError, TextSource};
use crate::vocab::Vocabulary;
use crate::{TocEntry, sort_entries};

/// Lines longer than this are never headers.
const MAX_LINE_LEN: usize = 100;

/// Weights and thresholds for the header scoring rules.
///
/// Every rule contributes a signed, named weight so the scoring function
/// stays auditable and each rule can be tested in isolation. The defaults
/// are tuned against academic papers and technical books; override fields
/// as needed.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// A candidate is accepted when its score reaches this value (inclusive).
    pub accept_threshold: f64,
    /// Starting score for any structural pattern match.
    pub base_score: f64,
    /// Boost per title word found in the academic vocabulary.
    pub vocab_word_boost: f64,
    /// Upper bound on the total vocabulary boost.
    pub vocab_boost_cap: f64,
    /// Boost for an entirely uppercase title longer than 3 characters.
    pub all_caps_boost: f64,
    /// Boost for a title-cased title (small connecting words exempt).
    pub title_case_boost: f64,
    /// Penalty for a title ending in sentence punctuation.
    pub trailing_punctuation_penalty: f64,
    /// Penalty for a single-word title absent from the vocabulary.
    pub single_word_penalty: f64,
    /// Penalty for titles longer than `max_title_words`.
    pub long_title_penalty: f64,
    /// Word count above which a title is treated as body text.
    pub max_title_words: usize,
    /// Penalty for reference-list lines like `12. Lastname,`.
    pub citation_penalty: f64,
    /// Penalty when the title opens with a body-text starter word.
    pub body_starter_penalty: f64,
    /// Penalty for author-list lines like `3. J. A. Smith`.
    pub author_list_penalty: f64,
    /// Penalty for copyright/publisher markers and year ranges.
    pub publisher_penalty: f64,
    /// Penalty applied when the leading section number is implausible.
    pub section_number_penalty: f64,
    /// Largest leading section number still considered plausible. Documents
    /// rarely have more main sections than this; higher numbers are usually
    /// reference-list indices.
    pub max_section_number: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.4,
            base_score: 0.35,
            vocab_word_boost: 0.15,
            vocab_boost_cap: 0.35,
            all_caps_boost: 0.2,
            title_case_boost: 0.1,
            trailing_punctuation_penalty: 0.2,
            single_word_penalty: 0.15,
            long_title_penalty: 0.2,
            max_title_words: 10,
            citation_penalty: 0.5,
            body_starter_penalty: 0.3,
            author_list_penalty: 0.5,
            publisher_penalty: 0.5,
            section_number_penalty: 0.3,
            max_section_number: 15,
        }
    }
}

/// A structural match with its heuristic confidence. Never leaves this
/// module; accepted candidates are unwrapped into plain entries.
struct ScoredCandidate {
    score: f64,
    entry: TocEntry,
}

/// Scan every page for section headers and return the accepted entries,
/// deduplicated and sorted by (page, level).
pub fn extract_section_headers(doc: &dyn TextSource) -> Result<Vec<TocEntry>, BackendError> {
    extract_section_headers_with(doc, &ScanConfig::default(), Vocabulary::shared())
}

/// Config-aware version of [`extract_section_headers`].
pub fn extract_section_headers_with(
    doc: &dyn TextSource,
    config: &ScanConfig,
    vocab: &Vocabulary,
) -> Result<Vec<TocEntry>, BackendError> {
    tracing::debug!("scanning document for section headers");

    let mut entries: Vec<TocEntry> = Vec::new();
    let mut seen: std::collections::HashSet<(String, usize)> = std::collections::HashSet::new();

    for page_idx in 0..doc.page_count() {
        let text = doc.page_text(page_idx)?;
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let page_number = page_idx + 1;

        let mut i = 0usize;
        while i < lines.len() {
            let (candidate, consumed) = scan_at(&lines, i, page_number, config, vocab);
            if let Some(c) = candidate {
                if c.score >= config.accept_threshold && seen.insert(c.entry.dedup_key()) {
                    entries.push(c.entry);
                }
            }
            i += consumed;
        }
    }

    sort_entries(&mut entries);
    tracing::debug!(count = entries.len(), "section headers found");
    Ok(entries)
}

/// Examine the line at `idx`, possibly combining a bare section number with
/// the following line. Returns the candidate (if any structural pattern
/// matched) and the number of lines consumed.
fn scan_at(
    lines: &[&str],
    idx: usize,
    page_number: usize,
    config: &ScanConfig,
    vocab: &Vocabulary,
) -> (Option<ScoredCandidate>, usize) {
    static BARE_SECTION_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+)*$").unwrap());
    static TITLE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z]").unwrap());

    let line = lines[idx];
    if line.is_empty() || line.len() > MAX_LINE_LEN {
        return (None, 1);
    }

    let (score, entry) = score_section_header(line, page_number, config, vocab);
    if let Some(entry) = entry {
        return (Some(ScoredCandidate { score, entry }), 1);
    }

    // A section number alone on its line may belong to a header whose title
    // wrapped onto the next line.
    if idx + 1 < lines.len() && BARE_SECTION_NUMBER.is_match(line) {
        let next = lines[idx + 1];
        if !next.is_empty() && next.len() < 80 {
            // Suppress running page numbers: a bare number near the top or
            // bottom of the page that equals the 1-based page index is a
            // header/footer artifact, not a section number.
            if let Some(Ok(leading)) = line.split('.').next().map(str::parse::<usize>) {
                let edge_position = idx < 3 || idx + 3 >= lines.len();
                if edge_position && leading == page_number {
                    return (None, 1);
                }
            }

            if TITLE_START.is_match(next) {
                let combined = format!("{} {}", line, next);
                let (score, entry) = score_section_header(&combined, page_number, config, vocab);
                if let Some(entry) = entry {
                    let consumed = if score >= config.accept_threshold { 2 } else { 1 };
                    return (Some(ScoredCandidate { score, entry }), consumed);
                }
            }
        }
    }

    (None, 1)
}

/// Score a line as a potential section header.
///
/// Returns the clamped score in [0, 1] and the matched entry, or `None`
/// when no structural pattern matches at all.
pub fn score_section_header(
    line: &str,
    page_number: usize,
    config: &ScanConfig,
    vocab: &Vocabulary,
) -> (f64, Option<TocEntry>) {
    static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]+").unwrap());
    static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.?\s*").unwrap());
    // Reference-list line: "12. Lastname, ..."
    static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+[A-Z][a-z]*\s*,").unwrap());
    // Author list: "3. J. A. Smith"
    static AUTHOR_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+[A-Z]\.\s+[A-Z]").unwrap());
    // Publisher imprints, copyright marks, year ranges.
    static PUBLISHER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"ACM|IEEE|Springer|©|\d{4}[-/]\d{2,4}").unwrap());
    static SECTION_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.").unwrap());

    // Quick rejection for obvious non-headers.
    if line.len() < 3 || line.len() > 80 {
        return (0.0, None);
    }

    let Some(entry) = try_match_section_pattern(line, page_number) else {
        return (0.0, None);
    };

    let mut score = config.base_score;

    // Academic vocabulary is the strongest positive signal.
    let academic_matches = WORD
        .find_iter(&entry.title)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| vocab.is_academic(w))
        .collect::<std::collections::HashSet<_>>()
        .len();
    if academic_matches > 0 {
        score += config
            .vocab_boost_cap
            .min(academic_matches as f64 * config.vocab_word_boost);
    }

    let title_part = LEADING_NUMBER.replace(&entry.title, "").trim().to_string();

    if is_all_uppercase(&title_part) && title_part.len() > 3 {
        score += config.all_caps_boost;
    } else if title_part.chars().next().is_some_and(|c| c.is_uppercase())
        && is_title_case(&title_part)
    {
        score += config.title_case_boost;
    }

    if title_part.ends_with(['.', ',', ';']) {
        score -= config.trailing_punctuation_penalty;
    }

    let word_count = title_part.split_whitespace().count();
    if word_count == 1 && academic_matches == 0 {
        score -= config.single_word_penalty;
    }
    if word_count > config.max_title_words {
        score -= config.long_title_penalty;
    }

    if CITATION.is_match(line) {
        score -= config.citation_penalty;
    }

    if let Some(first_word) = title_part.split_whitespace().next() {
        if vocab.is_body_starter(&first_word.to_lowercase()) {
            score -= config.body_starter_penalty;
        }
    }

    if AUTHOR_LIST.is_match(line) {
        score -= config.author_list_penalty;
    }

    if PUBLISHER.is_match(line) {
        score -= config.publisher_penalty;
    }

    if let Some(caps) = SECTION_NUMBER.captures(&entry.title) {
        if let Ok(number) = caps[1].parse::<usize>() {
            if number > config.max_section_number {
                score -= config.section_number_penalty;
            }
            if number == 0 {
                score -= config.section_number_penalty;
            }
        }
    }

    (score.clamp(0.0, 1.0), Some(entry))
}

/// Match a line against the section numbering patterns, in priority order.
fn try_match_section_pattern(line: &str, page_number: usize) -> Option<TocEntry> {
    static CHAPTER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^chapter\s+(\d+)[:\s]+(.+)$").unwrap());
    static SUBSUBSECTION: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d+\.\d+\.\d+)\s+(.+)$").unwrap());
    static SUBSECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.\d+)\s+(.+)$").unwrap());
    static SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})\.?\s+(.+)$").unwrap());

    /// Main-section numbers above this never match at all.
    const MATCH_SECTION_LIMIT: usize = 20;

    if let Some(caps) = CHAPTER.captures(line) {
        let title = caps[2].trim().to_string();
        if title.len() >= 2 {
            let title = format!("Chapter {}: {}", &caps[1], title);
            return Some(TocEntry::new(1, title, page_number));
        }
    }

    if let Some(caps) = SUBSUBSECTION.captures(line) {
        let title = caps[2].trim().to_string();
        if title.len() >= 3 {
            return Some(TocEntry::new(
                4,
                format!("{} {}", &caps[1], title),
                page_number,
            ));
        }
    }

    if let Some(caps) = SUBSECTION.captures(line) {
        let title = caps[2].trim().to_string();
        if title.len() >= 3 {
            return Some(TocEntry::new(
                3,
                format!("{} {}", &caps[1], title),
                page_number,
            ));
        }
    }

    if let Some(caps) = SECTION.captures(line) {
        let title = caps[2].trim().to_string();
        let number: usize = caps[1].parse().ok()?;
        if title.len() >= 3 && number <= MATCH_SECTION_LIMIT {
            return Some(TocEntry::new(
                2,
                format!("{}. {}", &caps[1], title),
                page_number,
            ));
        }
    }

    None
}

/// Every alphabetic character uppercase, with at least one present.
fn is_all_uppercase(s: &str) -> bool {
    let mut any = false;
    for c in s.chars().filter(|c| c.is_alphabetic()) {
        if c.is_lowercase() {
            return false;
        }
        any = true;
    }
    any
}

/// Every significant word capitalized; short connecting words are allowed
/// in lowercase.
fn is_title_case(s: &str) -> bool {
    const SMALL_WORDS: &[&str] = &["a", "an", "the", "of", "and", "in", "on", "for", "to", "with"];
    let mut words = s.split_whitespace().peekable();
    if words.peek().is_none() {
        return false;
    }
    words.all(|w| {
        w.chars().next().is_some_and(|c| c.is_uppercase())
            || SMALL_WORDS.contains(&w.to_lowercase().as_str())
    })
}
