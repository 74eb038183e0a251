//! Reference word lists for the section-header scanner.
//!
//! Two sets: words that commonly appear in academic section titles
//! (a positive signal) and words that commonly start ordinary body-text
//! sentences (a negative signal). Both are loaded once per process and
//! never mutated; the scanner takes them by reference so alternative
//! vocabularies can be supplied in tests or by embedders.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Words that frequently occur in section headings of academic and
/// technical documents.
static ACADEMIC_WORDS: &[&str] = &[
    "abstract",
    "acknowledgments",
    "acknowledgements",
    "algorithm",
    "algorithms",
    "analysis",
    "appendix",
    "approach",
    "architecture",
    "background",
    "bibliography",
    "conclusion",
    "conclusions",
    "contributions",
    "data",
    "dataset",
    "datasets",
    "definitions",
    "design",
    "discussion",
    "evaluation",
    "experiment",
    "experimental",
    "experiments",
    "findings",
    "formulation",
    "framework",
    "future",
    "glossary",
    "implementation",
    "index",
    "introduction",
    "limitations",
    "literature",
    "materials",
    "method",
    "methodology",
    "methods",
    "model",
    "models",
    "motivation",
    "notation",
    "overview",
    "performance",
    "preface",
    "preliminaries",
    "problem",
    "proof",
    "proofs",
    "references",
    "related",
    "results",
    "review",
    "setup",
    "summary",
    "survey",
    "theory",
    "validation",
    "work",
];

/// Function words and connectives that open ordinary prose sentences.
/// A "heading" starting with one of these is almost always a numbered
/// line of body text.
static BODY_TEXT_STARTERS: &[&str] = &[
    "a",
    "about",
    "additionally",
    "after",
    "also",
    "although",
    "an",
    "and",
    "as",
    "at",
    "because",
    "before",
    "both",
    "but",
    "by",
    "consequently",
    "consider",
    "each",
    "finally",
    "first",
    "for",
    "from",
    "furthermore",
    "given",
    "hence",
    "here",
    "however",
    "if",
    "in",
    "it",
    "its",
    "let",
    "many",
    "meanwhile",
    "moreover",
    "most",
    "nevertheless",
    "note",
    "of",
    "on",
    "or",
    "other",
    "our",
    "second",
    "several",
    "similarly",
    "since",
    "some",
    "such",
    "suppose",
    "that",
    "the",
    "then",
    "there",
    "therefore",
    "these",
    "they",
    "this",
    "those",
    "thus",
    "to",
    "we",
    "when",
    "where",
    "while",
    "with",
];

/// The two reference word sets used by the header scanner.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    academic: HashSet<&'static str>,
    body_starters: HashSet<&'static str>,
}

impl Vocabulary {
    /// Whether a lowercased word belongs to the academic section vocabulary.
    pub fn is_academic(&self, word: &str) -> bool {
        self.academic.contains(word)
    }

    /// Whether a lowercased word is a common body-text sentence opener.
    pub fn is_body_starter(&self, word: &str) -> bool {
        self.body_starters.contains(word)
    }
}

static DEFAULT_VOCABULARY: Lazy<Vocabulary> = Lazy::new(|| Vocabulary {
    academic: ACADEMIC_WORDS.iter().copied().collect(),
    body_starters: BODY_TEXT_STARTERS.iter().copied().collect(),
});

impl Vocabulary {
    /// The built-in word lists, loaded once per process.
    pub fn shared() -> &'static Vocabulary {
        &DEFAULT_VOCABULARY
    }
}
