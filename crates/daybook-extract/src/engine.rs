//! The extraction engine: one pass over an insight document, producing a
//! [`DailyExtraction`].
//!
//! Extraction is pure and does no I/O; identical `(content, date)` input
//! yields a byte-identical record, so reprocessing can rewrite all derived
//! rows from scratch.
//!
//! List-shaped fields resolve through static per-field plans: an ordered
//! list of attempts, each merging one or more section/subsection sources;
//! the first attempt that produces any items wins. Shape-specific fields
//! (themes, quotes, highlights, nuggets, exchanges) have their own passes.
//!
//! Known overlap: a blockquote inside "Memorable Exchanges" that carries an
//! attribution is captured both as a quote (attribution read as speaker)
//! and as exchange dialogue (attribution read as context).

use std::collections::HashSet;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use daybook_core::models::{
    DailyExtraction, DialogueLine, KnowledgeNugget, MemorableExchange, Quote, Theme,
};
use daybook_core::Result;

use crate::bullets::{
    bullet_items, bullet_line_text, doubled_header_items, parse_titled, passes_noise_filter,
    raw_bullet_items, titled_bullets,
};
use crate::quotes::{blockquote_text, parse_attribution, quote_groups, split_speaker};
use crate::schema;
use crate::section::{find_section, find_subsection, plain_header_level};
use crate::text::{clean_item, strip_outer_quotes};

// =============================================================================
// FIELD PLANS
// =============================================================================

/// One section or subsection lookup feeding a field.
#[derive(Debug, Clone, Copy)]
enum SourceRef {
    Section(&'static str),
    Sub(&'static str, &'static str),
}

use SourceRef::{Section, Sub};

/// Ordered attempts for a list field. Sources within an attempt merge in
/// order; the first attempt yielding any items wins.
type FieldPlan = &'static [&'static [SourceRef]];

const ACTION_ITEMS: FieldPlan = &[
    &[
        Sub("Key Follow-Ups", "For You to Action"),
        Sub("Key Follow-Ups", "Household To-Dos"),
    ],
    &[Sub("Commitment Tracker", "Promises from You")],
];

const DECISIONS: FieldPlan = &[
    &[Sub("Decision Log", "Decisions Made")],
    &[Section("Strategic Decisions Made")],
];

const IDEAS: FieldPlan = &[
    &[Sub("Idea Sandbox", "Seeds of an Idea")],
    &[Section("Ideas to Explore")],
];

const QUESTIONS: FieldPlan = &[&[
    Section("Open Questions to Resolve"),
    Section("Unresolved Questions"),
]];

/// Section names the shape-specific passes consume.
const KEY_FOLLOW_UPS: &str = "Key Follow-Ups";
const KNOWLEDGE_NUGGETS: &str = "Knowledge Nuggets";
const MEMORABLE_EXCHANGES: &str = "Memorable Exchanges";

static RECURRING_THEME_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*#{2,3}.*recurring theme").unwrap());
static HIGHLIGHTS_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:#{2,3}\s*(?:#{2,3}\s*)?Top Highlights|\*\*Top Highlights:?\*\*:?)\s*\S?\s*$")
        .unwrap()
});
static QUOTE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\*Quote that stands out:?\*\*:?\s*(.+)$").unwrap());
static QUOTE_SPEAKER_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s+[—–]\s*(.+)$").unwrap());
static NUGGET_SOURCE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)\s*_Source:\s*([^_]+)_\s*$").unwrap());

const EXCLUDED_THEME_TITLE: &str = "quote that stands out";

// =============================================================================
// ENGINE
// =============================================================================

/// Extract the structured record from one insight document.
///
/// Absence of content is never an error; every field may come back empty.
/// The only failure is a structurally invalid assembled record.
pub fn extract(content: &str, date: NaiveDate) -> Result<DailyExtraction> {
    let record = DailyExtraction {
        date,
        action_items: action_items(content),
        decisions: resolve_field(content, DECISIONS),
        ideas: resolve_field(content, IDEAS),
        questions: resolve_field(content, QUESTIONS),
        themes: themes(content),
        quotes: quotes(content),
        highlights: highlights(content),
        knowledge_nuggets: knowledge_nuggets(content),
        memorable_exchanges: memorable_exchanges(content),
    };
    schema::validate(&record)?;
    tracing::debug!(
        subsystem = "extract",
        component = "engine",
        op = "extract",
        doc_date = %record.date,
        item_count = record.item_count(),
        "extraction complete"
    );
    Ok(record)
}

/// Items from one source span: flat bullets, retrying the doubled-header
/// shape when the bullet pass comes back empty.
fn section_items(content: &str, source: SourceRef) -> Vec<String> {
    let span = match source {
        Section(name) => find_section(content, name),
        Sub(section, sub) => find_subsection(content, section, sub),
    };
    let Some(span) = span else {
        return Vec::new();
    };
    let items = bullet_items(span);
    if !items.is_empty() {
        return items;
    }
    doubled_header_items(span)
}

fn resolve_field(content: &str, plan: FieldPlan) -> Vec<String> {
    for attempt in plan {
        let mut items = Vec::new();
        for source in *attempt {
            items.extend(section_items(content, *source));
        }
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

/// Action items: the plan resolution, preceded by a doubled-header pre-pass
/// over the whole "Key Follow-Ups" section whenever that header is present.
/// The pre-pass catches documents that skip the usual subsections and list
/// items as `### ### Title` directly under the section header.
fn action_items(content: &str) -> Vec<String> {
    let mut items = Vec::new();
    if content.contains(KEY_FOLLOW_UPS) {
        if let Some(span) = find_section(content, KEY_FOLLOW_UPS) {
            items.extend(doubled_header_items(span));
        }
    }
    items.extend(resolve_field(content, ACTION_ITEMS));
    items
}

// =============================================================================
// SHAPE-SPECIFIC PASSES
// =============================================================================

/// Every `###`-ish block whose header mentions a recurring theme, anywhere
/// in the document. Titled bullets inside become themes; bullets that are
/// really embedded quote callouts are excluded.
fn themes(content: &str) -> Vec<Theme> {
    let mut themes = Vec::new();
    for span in matching_header_blocks(content, &RECURRING_THEME_HEADER) {
        for (title, rest) in titled_bullets(span) {
            if title.to_lowercase().contains(EXCLUDED_THEME_TITLE) {
                continue;
            }
            themes.push(Theme {
                title: clean_item(&title),
                description: clean_item(&rest),
            });
        }
    }
    themes
}

/// Quotes, whole document, two passes: bold "Quote that stands out" callout
/// lines first, then attributed blockquote groups. Later candidates whose
/// cleaned text already appeared are dropped.
fn quotes(content: &str) -> Vec<Quote> {
    let mut quotes: Vec<Quote> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for line in content.lines() {
        if let Some(cap) = QUOTE_PREFIX.captures(line) {
            let rest = cap[1].trim();
            let (text_part, speaker) = match QUOTE_SPEAKER_SPLIT.captures(rest) {
                Some(split) => (
                    split[1].to_string(),
                    Some(clean_item(&split[2])).filter(|s| !s.is_empty()),
                ),
                None => (rest.to_string(), None),
            };
            let text = strip_outer_quotes(&clean_item(&text_part));
            if !text.is_empty() && seen.insert(text.clone()) {
                quotes.push(Quote { text, speaker });
            }
        }
    }

    for group in quote_groups(content) {
        let Some(attribution) = group.attribution.clone() else {
            continue;
        };
        let text = group.joined_text();
        if !text.is_empty() && seen.insert(text.clone()) {
            quotes.push(Quote {
                text,
                speaker: Some(attribution),
            });
        }
    }

    quotes
}

/// Bullet lines directly under a "Top Highlights" marker (header or bold
/// line). No continuation folding; the first non-bullet, non-blank line
/// ends the block.
fn highlights(content: &str) -> Vec<String> {
    let mut highlights = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        if !in_block {
            if HIGHLIGHTS_MARKER.is_match(line) {
                in_block = true;
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        match bullet_line_text(line) {
            Some(text) => {
                let cleaned = clean_item(text);
                if passes_noise_filter(&cleaned) {
                    highlights.push(cleaned);
                }
            }
            None => break,
        }
    }
    highlights
}

/// Knowledge nuggets: bullets under the "Knowledge Nuggets" section shaped
/// `* **Category:** fact _Source: provenance_`, category and source both
/// optional. The source suffix is stripped from the fact before cleaning.
fn knowledge_nuggets(content: &str) -> Vec<KnowledgeNugget> {
    let Some(span) = find_section(content, KNOWLEDGE_NUGGETS) else {
        return Vec::new();
    };

    raw_bullet_items(span)
        .iter()
        .filter_map(|raw| {
            let (body, source) = match NUGGET_SOURCE_SUFFIX.captures(raw) {
                Some(cap) => (
                    cap[1].to_string(),
                    Some(clean_item(&cap[2])).filter(|s| !s.is_empty()),
                ),
                None => (raw.clone(), None),
            };
            let (category, fact_raw) = match parse_titled(&body) {
                Some((title, rest)) => (Some(clean_item(&title)), rest),
                None => (None, body),
            };
            let fact = clean_item(&fact_raw);
            if !passes_noise_filter(&fact) {
                return None;
            }
            Some(KnowledgeNugget {
                fact,
                category: category.filter(|c| !c.is_empty()),
                source,
            })
        })
        .collect()
}

/// Dialogue accumulator for the exchanges pass.
#[derive(Default)]
struct ExchangeAccumulator {
    dialogue: Vec<DialogueLine>,
    exchanges: Vec<MemorableExchange>,
}

impl ExchangeAccumulator {
    fn push_dialogue(&mut self, text: &str) {
        let (speaker, rest) = split_speaker(text);
        let cleaned = strip_outer_quotes(&clean_item(&rest));
        if !cleaned.is_empty() {
            self.dialogue.push(DialogueLine {
                speaker,
                text: cleaned,
            });
        }
    }

    /// Close the open exchange. Attribution arriving with no accumulated
    /// dialogue is a stray marker and records nothing.
    fn close(&mut self, context: Option<String>) {
        if !self.dialogue.is_empty() {
            self.exchanges.push(MemorableExchange {
                dialogue: std::mem::take(&mut self.dialogue),
                context,
            });
        }
    }

    /// Flush a group left open at end of span with no context.
    fn finish(mut self) -> Vec<MemorableExchange> {
        self.close(None);
        self.exchanges
    }
}

/// Dialogue exchanges under "Memorable Exchanges": blockquote lines
/// accumulate (a bold lead-in names the line's speaker) until an
/// attribution line closes the exchange with that text as context.
fn memorable_exchanges(content: &str) -> Vec<MemorableExchange> {
    let Some(span) = find_section(content, MEMORABLE_EXCHANGES) else {
        return Vec::new();
    };

    let mut acc = ExchangeAccumulator::default();
    for line in span.lines() {
        match blockquote_text(line) {
            Some(text) => match parse_attribution(text) {
                Some(context) => acc.close(Some(context)),
                None => acc.push_dialogue(text),
            },
            None => {
                if !line.trim().is_empty() {
                    acc.close(None);
                }
            }
        }
    }
    acc.finish()
}

/// Spans of every block whose header line matches, each ending at the next
/// plain header of equal-or-higher level.
fn matching_header_blocks<'a>(content: &'a str, matcher: &Regex) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut offset = 0;
    let mut open: Option<(usize, usize)> = None;

    for line in content.split_inclusive('\n') {
        let stripped = line.trim_end_matches(['\n', '\r']);
        if let Some((start, level)) = open {
            if let Some(l) = plain_header_level(stripped) {
                if l <= level {
                    blocks.push(&content[start..offset]);
                    open = None;
                }
            }
        }
        if open.is_none() && matcher.is_match(stripped) {
            let level = stripped.trim_start().chars().take_while(|&c| c == '#').count();
            open = Some((offset + line.len(), level));
        }
        offset += line.len();
    }
    if let Some((start, _)) = open {
        blocks.push(&content[start..]);
    }
    blocks
}
