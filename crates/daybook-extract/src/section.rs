//! Section and subsection location in insight markdown.
//!
//! Insight documents use `##` and `###` headers, in two conventions:
//!
//! - plain: `## Key Follow-Ups`
//! - doubled: `### ### Key Follow-Ups` (the header run repeated at the start
//!   of the line, a recurring quirk of the generating model)
//!
//! Headers may carry one trailing decorative glyph (`## Key Follow-Ups 🔥`).
//! A lookup matches either convention, case-insensitively, tolerating the
//! glyph, and returns the span strictly between the matched header line and
//! the next plain header of equal-or-higher level (or end of input). Doubled
//! lines are item markers inside a section and never terminate a span.

use regex::Regex;

use crate::text::escape_literal;

/// Level of a plain (single-run) header line, if the line is one.
///
/// Requires whitespace (or end of line) after the hash run, so `#hashtag`
/// is not a header. A second hash run after the first (`### ### Title`)
/// makes the line a doubled item marker, not a structural header.
pub(crate) fn plain_header_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let count = trimmed.chars().take_while(|&c| c == '#').count();
    if count == 0 {
        return None;
    }
    let rest = &trimmed[count..];
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
        return None;
    }
    if rest.trim_start().starts_with('#') {
        return None;
    }
    Some(count)
}

/// True for any line opening with a hash run (plain header or doubled marker).
pub(crate) fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let count = trimmed.chars().take_while(|&c| c == '#').count();
    if count == 0 {
        return false;
    }
    let rest = &trimmed[count..];
    rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')
}

/// Compile a whole-line matcher for a named header.
///
/// Accepts `##` or `###`, plain or doubled, case-insensitive name match, and
/// up to one trailing non-whitespace glyph. The name passes through
/// [`escape_literal`], which keeps the assembled pattern a fixed template.
fn header_matcher(name: &str) -> Regex {
    let pattern = format!(
        r"(?i)^\s*#{{2,3}}\s*(?:#{{2,3}}\s*)?{}\s*:?\s*\S?\s*$",
        escape_literal(name)
    );
    Regex::new(&pattern).expect("escaped header pattern compiles")
}

/// Hash-run level of a matched header line.
fn matched_level(line: &str) -> usize {
    line.trim_start().chars().take_while(|&c| c == '#').count()
}

/// Span between the first header matching `name` and the next plain header
/// of equal-or-higher level. `None` when no header matches; an empty span
/// when the header closes the document.
pub fn find_section<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    find_span(content, name)
}

/// Section lookup followed by a subsection lookup inside the section's span.
pub fn find_subsection<'a>(content: &'a str, section: &str, sub: &str) -> Option<&'a str> {
    find_span(content, section).and_then(|span| find_span(span, sub))
}

fn find_span<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let matcher = header_matcher(name);
    let mut offset = 0;
    let mut body_start: Option<usize> = None;
    let mut level = 0;

    for line in content.split_inclusive('\n') {
        let stripped = line.trim_end_matches(['\n', '\r']);
        match body_start {
            None => {
                if matcher.is_match(stripped) {
                    level = matched_level(stripped);
                    body_start = Some(offset + line.len());
                }
            }
            Some(start) => {
                if let Some(l) = plain_header_level(stripped) {
                    if l <= level {
                        return Some(&content[start..offset]);
                    }
                }
            }
        }
        offset += line.len();
    }

    body_start.map(|start| &content[start..])
}
