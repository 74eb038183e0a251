//! Level-sequence repair for outlines.
//!
//! Outline writers reject sequences that skip levels or start deeper than
//! level 1, so every extracted entry list passes through here before being
//! written.

use crate::TocEntry;

/// Normalize entry levels so the minimum level becomes 1 and no entry sits
/// more than one level below its predecessor.
///
/// Relative nesting is preserved by the shift; any remaining jump larger
/// than one step is clamped down to `previous + 1`, which guarantees a
/// well-formed tree.
pub fn normalize_levels(entries: &[TocEntry]) -> Vec<TocEntry> {
    let Some(min_level) = entries.iter().map(|e| e.level).min() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(entries.len());
    let mut prev_level = 0usize;
    for entry in entries {
        let shifted = entry.level - min_level + 1;
        let level = shifted.min(prev_level + 1);
        result.push(TocEntry::new(level, entry.title.clone(), entry.page));
        prev_level = level;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize_levels(&[]).is_empty());
    }

    #[test]
    fn shifts_minimum_level_to_one() {
        let entries = vec![TocEntry::new(3, "a", 1), TocEntry::new(4, "b", 2)];
        let normalized = normalize_levels(&entries);
        assert_eq!(normalized[0].level, 1);
        assert_eq!(normalized[1].level, 2);
    }

    #[test]
    fn clamps_level_jumps() {
        // 1 → 4 would orphan two levels; the jump is clamped to 2.
        let entries = vec![
            TocEntry::new(1, "a", 1),
            TocEntry::new(4, "b", 2),
            TocEntry::new(4, "c", 3),
        ];
        let normalized = normalize_levels(&entries);
        assert_eq!(normalized[0].level, 1);
        assert_eq!(normalized[1].level, 2);
        // The clamp cascades: "c" follows the already-clamped "b".
        assert_eq!(normalized[2].level, 3);
    }

    #[test]
    fn first_entry_deeper_than_one_is_clamped() {
        let entries = vec![TocEntry::new(1, "a", 1), TocEntry::new(1, "b", 5)];
        // Already normal input is untouched.
        assert_eq!(normalize_levels(&entries), entries);

        let entries = vec![TocEntry::new(2, "a", 1), TocEntry::new(1, "b", 5)];
        let normalized = normalize_levels(&entries);
        // Min level 1 keeps "b" at 1; "a" shifts to 2 but is clamped to 1
        // because nothing precedes it.
        assert_eq!(normalized[0].level, 1);
        assert_eq!(normalized[1].level, 1);
    }

    #[test]
    fn invariant_holds_for_adjacent_pairs() {
        let entries = vec![
            TocEntry::new(2, "a", 1),
            TocEntry::new(5, "b", 2),
            TocEntry::new(3, "c", 3),
            TocEntry::new(9, "d", 4),
        ];
        let normalized = normalize_levels(&entries);
        assert_eq!(normalized.iter().map(|e| e.level).min(), Some(1));
        let mut prev = 0usize;
        for e in &normalized {
            assert!(e.level <= prev + 1, "level jump at {:?}", e);
            prev = e.level;
        }
    }

    #[test]
    fn titles_and_pages_untouched() {
        let entries = vec![TocEntry::new(7, "Deep Title", 42)];
        let normalized = normalize_levels(&entries);
        assert_eq!(normalized[0].title, "Deep Title");
        assert_eq!(normalized[0].page, 42);
        assert_eq!(normalized[0].level, 1);
    }
}
