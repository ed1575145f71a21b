//! End-to-end extraction over a complete, realistic insight document.
//!
//! One document exercising every section shape the engine reads: flat
//! subsection bullets with bold lead-ins and wrapped lines, titled theme
//! bullets, quote callouts, highlight blocks, sourced knowledge nuggets,
//! and an attributed dialogue exchange.

use chrono::NaiveDate;
use daybook_extract::extract;

const DOCUMENT: &str = "\
# Daily Insights

## 🔄 Recurring Themes

### Recurring Theme Noticed
- **Time pressure:** Deadlines came up in four separate conversations today.
- **Quote that stands out:** \"We can't keep moving the goalposts.\"

## Key Follow-Ups 🔥

### For You to Action
- **Email the landlord** about the broken water heater before Friday
- Book the dentist appointment you postponed
  last month

### Household To-Dos
- Replace the furnace filter before the cold snap

## Decision Log

### Decisions Made
- Go with the fixed-rate refinance offer from the credit union

## Idea Sandbox

### Seeds of an Idea
- A shared grocery list app for the building's bulk orders

## Open Questions to Resolve
- Should the kids switch to the earlier bus route?

## Top Highlights
- Finished the grant application two days early
- ok

## Knowledge Nuggets
* **Astronomy:** Jupiter's Great Red Spot has been shrinking for a century. _Source: Podcast on the drive home_
* tiny

## Memorable Exchanges
> **Maya:** Did you actually read the fine print?
> **You:** \"Every last line of it.\"
> _— over coffee this morning_

## Quote Corner
- **Quote that stands out:** \"Slow is smooth, smooth is fast.\" — Coach Daniels
";

fn doc_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 24).unwrap()
}

#[test]
fn test_full_document_all_fields() {
    let record = extract(DOCUMENT, doc_date()).unwrap();

    assert_eq!(record.date, doc_date());

    assert_eq!(
        record.action_items,
        vec![
            "Email the landlord about the broken water heater before Friday",
            "Book the dentist appointment you postponed last month",
            "Replace the furnace filter before the cold snap",
        ]
    );
    assert_eq!(
        record.decisions,
        vec!["Go with the fixed-rate refinance offer from the credit union"]
    );
    assert_eq!(
        record.ideas,
        vec!["A shared grocery list app for the building's bulk orders"]
    );
    assert_eq!(
        record.questions,
        vec!["Should the kids switch to the earlier bus route?"]
    );

    assert_eq!(record.themes.len(), 1);
    assert_eq!(record.themes[0].title, "Time pressure");
    assert_eq!(
        record.themes[0].description,
        "Deadlines came up in four separate conversations today."
    );

    // "ok" falls under the noise threshold.
    assert_eq!(
        record.highlights,
        vec!["Finished the grant application two days early"]
    );

    assert_eq!(record.knowledge_nuggets.len(), 1);
    let nugget = &record.knowledge_nuggets[0];
    assert_eq!(
        nugget.fact,
        "Jupiter's Great Red Spot has been shrinking for a century."
    );
    assert_eq!(nugget.category.as_deref(), Some("Astronomy"));
    assert_eq!(nugget.source.as_deref(), Some("Podcast on the drive home"));

    assert_eq!(record.memorable_exchanges.len(), 1);
    let exchange = &record.memorable_exchanges[0];
    assert_eq!(exchange.dialogue.len(), 2);
    assert_eq!(exchange.dialogue[0].speaker.as_deref(), Some("Maya"));
    assert_eq!(
        exchange.dialogue[0].text,
        "Did you actually read the fine print?"
    );
    assert_eq!(exchange.dialogue[1].speaker.as_deref(), Some("You"));
    assert_eq!(exchange.dialogue[1].text, "Every last line of it.");
    assert_eq!(exchange.context.as_deref(), Some("over coffee this morning"));
}

#[test]
fn test_full_document_quotes_and_overlap() {
    let record = extract(DOCUMENT, doc_date()).unwrap();

    // Two callout quotes in line order, then the attributed exchange
    // dialogue surfacing a second time as a quote.
    assert_eq!(record.quotes.len(), 3);
    assert_eq!(
        record.quotes[0].text,
        "We can't keep moving the goalposts."
    );
    assert_eq!(record.quotes[0].speaker, None);
    assert_eq!(record.quotes[1].text, "Slow is smooth, smooth is fast.");
    assert_eq!(record.quotes[1].speaker.as_deref(), Some("Coach Daniels"));
    assert_eq!(
        record.quotes[2].speaker.as_deref(),
        Some("over coffee this morning")
    );
}

#[test]
fn test_full_document_is_deterministic() {
    let first = extract(DOCUMENT, doc_date()).unwrap();
    let second = extract(DOCUMENT, doc_date()).unwrap();
    assert_eq!(first, second);

    let json = serde_json::to_value(&first).unwrap();
    assert_eq!(json["date"], "2025-09-24");
    assert_eq!(json["action_items"].as_array().unwrap().len(), 3);
    assert_eq!(json["memorable_exchanges"][0]["dialogue"][0]["speaker"], "Maya");
}

#[test]
fn test_reordered_sections_extract_identically() {
    let reordered = "\
## Knowledge Nuggets
* **Astronomy:** Jupiter's Great Red Spot has been shrinking for a century. _Source: Podcast on the drive home_

## Decision Log

### Decisions Made
- Go with the fixed-rate refinance offer from the credit union
";
    let record = extract(reordered, doc_date()).unwrap();
    assert_eq!(record.knowledge_nuggets.len(), 1);
    assert_eq!(
        record.decisions,
        vec!["Go with the fixed-rate refinance offer from the credit union"]
    );
}
