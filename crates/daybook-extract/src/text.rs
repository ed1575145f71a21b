//! Text cleanup primitives shared by the extraction passes.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static WHITESPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_PATTERN.replace_all(s.trim(), " ").to_string()
}

/// Remove `**bold**` markers, keeping the inner text.
///
/// Unterminated or nested markers stay literal.
pub fn strip_bold(s: &str) -> String {
    BOLD_PATTERN.replace_all(s, "$1").to_string()
}

/// Standard item cleanup: bold-strip, then whitespace-collapse.
pub fn clean_item(s: &str) -> String {
    collapse_whitespace(&strip_bold(s))
}

/// Strip one pair of surrounding double quotes (straight or curly).
pub fn strip_outer_quotes(s: &str) -> String {
    let trimmed = s.trim();
    let mut chars = trimmed.chars();
    let (first, last) = (chars.next(), chars.next_back());
    let opens = matches!(first, Some('"') | Some('\u{201C}'));
    let closes = matches!(last, Some('"') | Some('\u{201D}'));
    if opens && closes && trimmed.chars().count() >= 2 {
        let inner: String = trimmed.chars().skip(1).collect();
        let mut inner_chars = inner.chars();
        inner_chars.next_back();
        return inner_chars.as_str().trim().to_string();
    }
    trimmed.to_string()
}

/// Escape a header name for interpolation into a dynamically built pattern.
///
/// Every dynamic header lookup goes through this gate; raw names never reach
/// the regex engine.
pub fn escape_literal(s: &str) -> String {
    regex::escape(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a   b\t\nc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("single"), "single");
    }

    #[test]
    fn test_strip_bold() {
        assert_eq!(strip_bold("**bold** text"), "bold text");
        assert_eq!(strip_bold("a **b** c **d**"), "a b c d");
    }

    #[test]
    fn test_strip_bold_unterminated_stays_literal() {
        assert_eq!(strip_bold("**unterminated text"), "**unterminated text");
    }

    #[test]
    fn test_clean_item() {
        assert_eq!(
            clean_item("  **Call dentist**   about appointment "),
            "Call dentist about appointment"
        );
    }

    #[test]
    fn test_strip_outer_quotes_straight() {
        assert_eq!(strip_outer_quotes("\"hello\""), "hello");
    }

    #[test]
    fn test_strip_outer_quotes_curly() {
        assert_eq!(strip_outer_quotes("\u{201C}hello\u{201D}"), "hello");
    }

    #[test]
    fn test_strip_outer_quotes_unbalanced_kept() {
        assert_eq!(strip_outer_quotes("\"hello"), "\"hello");
        assert_eq!(strip_outer_quotes("hello\""), "hello\"");
    }

    #[test]
    fn test_strip_outer_quotes_inner_quotes_kept() {
        assert_eq!(
            strip_outer_quotes("\"she said \"hi\" twice\""),
            "she said \"hi\" twice"
        );
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("Key Follow-Ups"), r"Key Follow\-Ups");
        assert_eq!(escape_literal("a.b*c"), r"a\.b\*c");
    }
}
