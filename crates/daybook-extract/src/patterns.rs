//! Recurring-header census across stored documents.
//!
//! The engine reads a fixed set of section names. The generating model
//! occasionally starts producing a new recurring section, and this census
//! surfaces those: it counts `##`-level headers outside the known set so an
//! operator can decide whether the engine should learn to read them.
//! Invoked from document sync behind a scan policy; pure in itself.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::section::plain_header_level;
use crate::text::collapse_whitespace;

/// Section and subsection names the engine already reads.
pub fn known_section_names() -> &'static [&'static str] {
    &[
        "Key Follow-Ups",
        "For You to Action",
        "Household To-Dos",
        "Commitment Tracker",
        "Promises from You",
        "Decision Log",
        "Decisions Made",
        "Strategic Decisions Made",
        "Idea Sandbox",
        "Seeds of an Idea",
        "Ideas to Explore",
        "Open Questions to Resolve",
        "Unresolved Questions",
        "Top Highlights",
        "Knowledge Nuggets",
        "Memorable Exchanges",
    ]
}

/// A `##`-level header recurring across documents that the engine does not
/// currently read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPatternCandidate {
    pub header: String,
    /// Number of distinct documents the header appears in.
    pub occurrences: usize,
}

/// Count unknown `##`-level headers across `docs`.
///
/// A header counts once per document however often it repeats inside one.
/// Known names are excluded case-insensitively, as are headers seen in
/// fewer than `min_docs` documents. Ordered by occurrence count descending,
/// then header name ascending.
pub fn scan_recurring_headers(docs: &[String], min_docs: usize) -> Vec<SectionPatternCandidate> {
    let known: HashSet<String> = known_section_names()
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in docs {
        let mut seen: HashSet<String> = HashSet::new();
        for line in doc.lines() {
            if plain_header_level(line) != Some(2) {
                continue;
            }
            let Some(header) = clean_header_text(line) else {
                continue;
            };
            if known.contains(&header.to_lowercase()) {
                continue;
            }
            seen.insert(header);
        }
        for header in seen {
            *counts.entry(header).or_insert(0) += 1;
        }
    }

    let mut candidates: Vec<SectionPatternCandidate> = counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences >= min_docs)
        .map(|(header, occurrences)| SectionPatternCandidate {
            header,
            occurrences,
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.header.cmp(&b.header))
    });
    candidates
}

/// Header text with hash markers, decorative glyphs, and a trailing colon
/// removed. `None` when nothing readable remains.
fn clean_header_text(line: &str) -> Option<String> {
    let text = line.trim_start().trim_start_matches('#');
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_ascii_punctuation() || c.is_whitespace())
        .collect();
    let cleaned = collapse_whitespace(&kept);
    let cleaned = cleaned.trim_end_matches(':').trim_end();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_known_names_cover_engine_sections() {
        let names = known_section_names();
        assert!(names.contains(&"Key Follow-Ups"));
        assert!(names.contains(&"Memorable Exchanges"));
        assert!(names.contains(&"Top Highlights"));
    }

    #[test]
    fn test_scan_finds_unknown_recurring_header() {
        let corpus = docs(&[
            "## Weekly Review\ntext\n",
            "## Weekly Review\nmore text\n",
        ]);
        let candidates = scan_recurring_headers(&corpus, 2);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].header, "Weekly Review");
        assert_eq!(candidates[0].occurrences, 2);
    }

    #[test]
    fn test_scan_counts_once_per_document() {
        let corpus = docs(&["## Weekly Review\ntext\n## Weekly Review\nagain\n"]);
        let candidates = scan_recurring_headers(&corpus, 1);
        assert_eq!(candidates[0].occurrences, 1);
    }

    #[test]
    fn test_scan_excludes_known_names() {
        let corpus = docs(&[
            "## Key Follow-Ups\n- item\n## Weekly Review\ntext\n",
            "## KEY FOLLOW-UPS\n- item\n## Weekly Review\ntext\n",
        ]);
        let candidates = scan_recurring_headers(&corpus, 1);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].header, "Weekly Review");
    }

    #[test]
    fn test_scan_min_docs_filter() {
        let corpus = docs(&[
            "## Common Section\n## Rare Section\n",
            "## Common Section\n",
            "## Common Section\n",
        ]);
        let candidates = scan_recurring_headers(&corpus, 2);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].header, "Common Section");
        assert_eq!(candidates[0].occurrences, 3);
    }

    #[test]
    fn test_scan_cleans_glyphs_and_colon() {
        let corpus = docs(&["## 🔄 Weekly Review:\ntext\n", "## Weekly Review\ntext\n"]);
        let candidates = scan_recurring_headers(&corpus, 2);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].header, "Weekly Review");
    }

    #[test]
    fn test_scan_ignores_deeper_headers() {
        let corpus = docs(&["### Subsection Only\ntext\n", "### Subsection Only\n"]);
        assert!(scan_recurring_headers(&corpus, 1).is_empty());
    }

    #[test]
    fn test_scan_ordering() {
        let corpus = docs(&[
            "## Beta Section\n## Alpha Section\n",
            "## Beta Section\n## Alpha Section\n",
            "## Beta Section\n",
        ]);
        let candidates = scan_recurring_headers(&corpus, 1);
        assert_eq!(candidates[0].header, "Beta Section");
        assert_eq!(candidates[1].header, "Alpha Section");
    }

    #[test]
    fn test_scan_empty_corpus() {
        assert!(scan_recurring_headers(&[], 1).is_empty());
    }
}
