//! Structural validation of an assembled [`DailyExtraction`].
//!
//! The extractors are expected to never emit empty strings or hollow
//! nested records; this pass enforces that before a record reaches
//! storage. A violation is an extractor bug surfacing, so the error names
//! the field and index instead of being silently repaired.

use daybook_core::models::DailyExtraction;
use daybook_core::{Error, Result};

/// Check every field of the record for structurally empty content.
pub fn validate(record: &DailyExtraction) -> Result<()> {
    check_flat("action_items", &record.action_items)?;
    check_flat("decisions", &record.decisions)?;
    check_flat("ideas", &record.ideas)?;
    check_flat("questions", &record.questions)?;
    check_flat("highlights", &record.highlights)?;

    for (i, theme) in record.themes.iter().enumerate() {
        if theme.title.trim().is_empty() {
            return Err(empty("themes", i, "title"));
        }
    }
    for (i, quote) in record.quotes.iter().enumerate() {
        if quote.text.trim().is_empty() {
            return Err(empty("quotes", i, "text"));
        }
    }
    for (i, nugget) in record.knowledge_nuggets.iter().enumerate() {
        if nugget.fact.trim().is_empty() {
            return Err(empty("knowledge_nuggets", i, "fact"));
        }
    }
    for (i, exchange) in record.memorable_exchanges.iter().enumerate() {
        if exchange.dialogue.is_empty() {
            return Err(empty("memorable_exchanges", i, "dialogue"));
        }
        for (j, line) in exchange.dialogue.iter().enumerate() {
            if line.text.trim().is_empty() {
                return Err(Error::Extraction(format!(
                    "memorable_exchanges[{}].dialogue[{}] has empty text",
                    i, j
                )));
            }
        }
    }
    Ok(())
}

fn check_flat(field: &str, items: &[String]) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        if item.trim().is_empty() {
            return Err(empty(field, i, "item"));
        }
    }
    Ok(())
}

fn empty(field: &str, index: usize, part: &str) -> Error {
    Error::Extraction(format!("{}[{}] has empty {}", field, index, part))
}
