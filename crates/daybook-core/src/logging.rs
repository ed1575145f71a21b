//! Structured logging schema and field name constants for daybook.
//!
//! All crates use these constants for consistent structured logging fields.
//! This ensures log aggregation tools (Loki, Elasticsearch) can query by
//! standardized field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), sync completions |
//! | DEBUG | Decision points, window bounds, config choices |
//! | TRACE | Per-item iteration, high-volume data (bullets, rows) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "extract", "db", "sync", "scheduler", "remote"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "insights", "lifelogs", "pendant", "pool", "reprocess"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "sync", "fetch_page", "upsert", "replace_records"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID being operated on.
pub const USER_ID: &str = "user_id";

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Content date (YYYY-MM-DD) of the document under extraction.
pub const DOC_DATE: &str = "doc_date";

/// Lifelog UUID being operated on.
pub const LIFELOG_ID: &str = "lifelog_id";

/// Remote-assigned identifier of a source item.
pub const REMOTE_ID: &str = "remote_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of candidate items fetched from the source.
pub const FETCHED: &str = "fetched";

/// Number of rows inserted during a sync pass.
pub const ADDED: &str = "added";

/// Number of rows updated during a sync pass.
pub const UPDATED: &str = "updated";

/// Number of unchanged items skipped during a sync pass.
pub const SKIPPED: &str = "skipped";

/// Number of extracted items in a derived record set.
pub const ITEM_COUNT: &str = "item_count";

/// Number of pages fetched from a paginated endpoint.
pub const PAGE_COUNT: &str = "page_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
