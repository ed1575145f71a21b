//! Bullet-list extraction from a located section span.
//!
//! Three list shapes occur in insight documents:
//!
//! 1. flat bullets (`- item` / `* item`), with wrapped continuation lines
//! 2. doubled-header items (`### ### Title` followed by free text)
//! 3. titled bullets (`- **Title:** description`), parsed before
//!    bold-stripping so the title marker survives
//!
//! Cleaned flat and doubled items shorter than the noise threshold are
//! dropped; stray markers and single words are markdown shrapnel, not
//! content.

use once_cell::sync::Lazy;
use regex::Regex;

use daybook_core::defaults::MIN_ITEM_CHARS;

use crate::section::{is_header_line, plain_header_level};
use crate::text::clean_item;

static BULLET_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[*-]\s+(.*)$").unwrap());
static DOUBLED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#{2,3}\s*#{2,3}\s+(.+)$").unwrap());
static TITLED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*([^*]+)\*\*:?\s*(.*)$").unwrap());

/// Bullet body text, if the line opens a bullet.
pub(crate) fn bullet_line_text(line: &str) -> Option<&str> {
    BULLET_START
        .captures(line)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// True when a cleaned item survives the noise filter.
pub(crate) fn passes_noise_filter(item: &str) -> bool {
    item.chars().count() >= MIN_ITEM_CHARS
}

/// Raw bullet items with continuation lines folded in, uncleaned.
///
/// A bullet line opens an item; following non-bullet, non-header, non-blank
/// lines append to it. Blank lines and header lines close the open item.
pub(crate) fn raw_bullet_items(span: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current: Option<String> = None;

    for line in span.lines() {
        if let Some(cap) = BULLET_START.captures(line) {
            if let Some(item) = current.take() {
                items.push(item);
            }
            current = Some(cap[1].to_string());
        } else if line.trim().is_empty() || is_header_line(line) {
            if let Some(item) = current.take() {
                items.push(item);
            }
        } else if let Some(item) = current.as_mut() {
            item.push(' ');
            item.push_str(line.trim());
        }
    }
    if let Some(item) = current {
        items.push(item);
    }
    items
}

/// Cleaned, noise-filtered flat bullet items from a span.
pub fn bullet_items(span: &str) -> Vec<String> {
    raw_bullet_items(span)
        .iter()
        .map(|raw| clean_item(raw))
        .filter(|item| passes_noise_filter(item))
        .collect()
}

/// Items in the doubled-header shape: `### ### Title` followed by free text
/// until the next doubled marker or plain header.
///
/// Yields `"Title: Description"`, or the title alone when no description
/// follows; the combined string passes the same noise filter as bullets.
pub fn doubled_header_items(span: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in span.lines() {
        if let Some(cap) = DOUBLED_MARKER.captures(line) {
            finish_doubled_item(&mut items, current.take());
            current = Some((cap[1].to_string(), Vec::new()));
        } else if plain_header_level(line).is_some() {
            finish_doubled_item(&mut items, current.take());
        } else if let Some((_, description)) = current.as_mut() {
            if !line.trim().is_empty() {
                description.push(line.trim().to_string());
            }
        }
    }
    finish_doubled_item(&mut items, current);
    items
}

fn finish_doubled_item(items: &mut Vec<String>, entry: Option<(String, Vec<String>)>) {
    let Some((title, description)) = entry else {
        return;
    };
    let title = clean_item(&title);
    let description = clean_item(&description.join(" "));
    let combined = if description.is_empty() {
        title
    } else {
        format!("{}: {}", title, description)
    };
    if passes_noise_filter(&combined) {
        items.push(combined);
    }
}

/// Parse a raw (unbulleted, uncleaned) item shaped `**Title:** rest`.
///
/// The trailing colon (inside or after the bold marker) is trimmed from the
/// title. Items without a leading bold title yield `None`.
pub(crate) fn parse_titled(raw: &str) -> Option<(String, String)> {
    let cap = TITLED_ITEM.captures(raw.trim())?;
    let title = cap[1].trim().trim_end_matches(':').trim().to_string();
    let rest = cap[2].trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some((title, rest))
}

/// Raw `(title, rest)` pairs from bullets shaped `- **Title:** rest`.
///
/// Parsed before bold-stripping so the title marker survives; bullets
/// without a leading bold title are skipped. Continuation lines fold into
/// `rest` as in the flat pass. Neither part is length-filtered here.
pub fn titled_bullets(span: &str) -> Vec<(String, String)> {
    raw_bullet_items(span)
        .iter()
        .filter_map(|raw| parse_titled(raw))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_items_basic() {
        let span = "- first item of the day\n- second item of the day\n";
        let items = bullet_items(span);
        assert_eq!(
            items,
            vec!["first item of the day", "second item of the day"]
        );
    }

    #[test]
    fn test_bullet_items_star_marker() {
        let span = "* starred item goes here\n";
        assert_eq!(bullet_items(span), vec!["starred item goes here"]);
    }

    #[test]
    fn test_bullet_items_strips_bold() {
        let span = "- **Call dentist** about appointment\n";
        assert_eq!(bullet_items(span), vec!["Call dentist about appointment"]);
    }

    #[test]
    fn test_bullet_items_continuation_folds() {
        let span = "- a wrapped item that\n  continues on the next line\n- second one here\n";
        let items = bullet_items(span);
        assert_eq!(items[0], "a wrapped item that continues on the next line");
        assert_eq!(items[1], "second one here");
    }

    #[test]
    fn test_bullet_items_blank_line_closes_item() {
        let span = "- item number one here\n\nloose paragraph text\n";
        let items = bullet_items(span);
        assert_eq!(items, vec!["item number one here"]);
    }

    #[test]
    fn test_bullet_items_header_closes_item() {
        let span = "- item before the header\n#### Deep header\nnot folded\n";
        let items = bullet_items(span);
        assert_eq!(items, vec!["item before the header"]);
    }

    #[test]
    fn test_noise_filter_drops_short_items() {
        let span = "- tiny\n- exactly10c\n- exactly11ch\n";
        let items = bullet_items(span);
        // 11 chars is the keep threshold
        assert_eq!(items, vec!["exactly11ch"]);
    }

    #[test]
    fn test_bullet_items_empty_span() {
        assert!(bullet_items("").is_empty());
        assert!(bullet_items("no bullets at all\n").is_empty());
    }

    #[test]
    fn test_doubled_header_items() {
        let span = "\
### ### Call dentist about appointment
Follow up on the cracked tooth.
### ### Renew passport before travel
";
        let items = doubled_header_items(span);
        assert_eq!(
            items,
            vec![
                "Call dentist about appointment: Follow up on the cracked tooth.",
                "Renew passport before travel",
            ]
        );
    }

    #[test]
    fn test_doubled_header_item_title_only() {
        let span = "### ### Standalone doubled item\n";
        assert_eq!(doubled_header_items(span), vec!["Standalone doubled item"]);
    }

    #[test]
    fn test_doubled_header_items_stop_at_plain_header() {
        let span = "\
### ### First doubled item title
description line
### Plain Subsection
stray text not part of any item
";
        let items = doubled_header_items(span);
        assert_eq!(items, vec!["First doubled item title: description line"]);
    }

    #[test]
    fn test_doubled_header_items_noise_filtered() {
        let span = "### ### tiny\n";
        assert!(doubled_header_items(span).is_empty());
    }

    #[test]
    fn test_titled_bullets() {
        let span = "- **Procrastination:** You keep delaying budget review.\n";
        let pairs = titled_bullets(span);
        assert_eq!(
            pairs,
            vec![(
                "Procrastination".to_string(),
                "You keep delaying budget review.".to_string()
            )]
        );
    }

    #[test]
    fn test_titled_bullets_colon_outside_bold() {
        let span = "- **Budget**: review the numbers\n";
        let pairs = titled_bullets(span);
        assert_eq!(
            pairs,
            vec![("Budget".to_string(), "review the numbers".to_string())]
        );
    }

    #[test]
    fn test_titled_bullets_skip_untitled() {
        let span = "- plain bullet without a bold title\n- **Titled:** with text\n";
        let pairs = titled_bullets(span);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "Titled");
    }

    #[test]
    fn test_titled_bullets_continuation_folds() {
        let span = "- **Theme:** starts here\n  and wraps to the next line\n";
        let pairs = titled_bullets(span);
        assert_eq!(
            pairs[0].1,
            "starts here and wraps to the next line".to_string()
        );
    }

    #[test]
    fn test_titled_bullets_empty_rest() {
        let span = "- **Consistency**\n";
        let pairs = titled_bullets(span);
        assert_eq!(pairs, vec![("Consistency".to_string(), String::new())]);
    }
}
