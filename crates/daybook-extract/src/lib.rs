//! # daybook-extract
//!
//! Structural extraction of daily insight documents.
//!
//! Insight documents are AI-generated markdown with a loosely stable layout
//! of sections, bullets, and blockquotes. This crate locates the sections,
//! parses the handful of list and quote shapes that occur in them, and
//! assembles a [`DailyExtraction`](daybook_core::models::DailyExtraction)
//! per document. Everything here is pure text processing: no I/O, no
//! database, no network.

pub mod bullets;
pub mod engine;
pub mod patterns;
pub mod quotes;
pub mod schema;
pub mod section;
pub mod text;

// Re-export commonly used entry points at crate root
pub use engine::extract;
pub use patterns::{known_section_names, scan_recurring_headers, SectionPatternCandidate};
pub use section::{find_section, find_subsection};
