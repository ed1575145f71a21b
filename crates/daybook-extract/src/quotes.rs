//! Blockquote grouping and attribution parsing.
//!
//! Quoted material appears as runs of `>` lines closed by an underscored
//! attribution line:
//!
//! ```text
//! > "We should just rebuild the whole thing."
//! > "It would take a weekend, tops."
//! > _— Marcus_
//! ```
//!
//! The same syntax carries two meanings: under a quotes heading the
//! attribution names the speaker, inside "Memorable Exchanges" it describes
//! the context. This module only groups and parses; callers assign the role.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::{clean_item, strip_outer_quotes};

static BLOCKQUOTE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*>\s?(.*)$").unwrap());
static SPEAKER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*([^*]+)\*\*:?\s*(.*)$").unwrap());

/// One run of blockquote lines with its closing attribution, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteGroup {
    /// Cleaned line texts, outer quote marks intact.
    pub lines: Vec<String>,
    pub attribution: Option<String>,
}

impl QuoteGroup {
    /// Lines joined with single spaces, outer quote marks stripped.
    pub fn joined_text(&self) -> String {
        strip_outer_quotes(&self.lines.join(" "))
    }
}

/// Content after the `>` marker, if the line is a blockquote line.
pub fn blockquote_text(line: &str) -> Option<&str> {
    BLOCKQUOTE_LINE
        .captures(line)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Parse an attribution from blockquote content.
///
/// An attribution is underscored text containing an em-dash, en-dash, or
/// hyphen: `_— Alice_`, `_- during dinner_`. The leading dash and underscore
/// wrapping are trimmed from the returned text.
pub fn parse_attribution(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !trimmed.starts_with('_') {
        return None;
    }
    if !trimmed.contains(['\u{2014}', '\u{2013}', '-']) {
        return None;
    }
    let inner = trimmed
        .trim_matches('_')
        .trim()
        .trim_start_matches(['\u{2014}', '\u{2013}', '-'])
        .trim();
    if inner.is_empty() {
        return None;
    }
    Some(clean_item(inner))
}

/// Split blockquote content into a speaker prefix and the rest.
///
/// `**Anna:** So how did it go?` yields `(Some("Anna"), "So how did it go?")`;
/// content without a bold lead-in yields no speaker.
pub fn split_speaker(text: &str) -> (Option<String>, String) {
    match SPEAKER_PREFIX.captures(text.trim()) {
        Some(cap) => {
            let speaker = cap[1].trim().trim_end_matches(':').trim().to_string();
            let rest = cap[2].to_string();
            if speaker.is_empty() {
                (None, text.trim().to_string())
            } else {
                (Some(speaker), rest)
            }
        }
        None => (None, text.trim().to_string()),
    }
}

/// Group a span's blockquote runs.
///
/// Consecutive `>` lines accumulate into a group; an attribution line closes
/// it with the attribution attached; any other non-blank line closes it
/// without one. Groups that hold no text when closed are discarded.
pub fn quote_groups(span: &str) -> Vec<QuoteGroup> {
    let mut groups = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for line in span.lines() {
        match blockquote_text(line) {
            Some(text) => {
                if let Some(attribution) = parse_attribution(text) {
                    if !lines.is_empty() {
                        groups.push(QuoteGroup {
                            lines: std::mem::take(&mut lines),
                            attribution: Some(attribution),
                        });
                    }
                    // Attribution with nothing accumulated: stray, dropped.
                } else {
                    let cleaned = clean_item(text);
                    if !cleaned.is_empty() {
                        lines.push(cleaned);
                    }
                }
            }
            None => {
                if !line.trim().is_empty() && !lines.is_empty() {
                    groups.push(QuoteGroup {
                        lines: std::mem::take(&mut lines),
                        attribution: None,
                    });
                }
            }
        }
    }
    if !lines.is_empty() {
        groups.push(QuoteGroup {
            lines,
            attribution: None,
        });
    }
    groups
}
