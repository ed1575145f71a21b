//! Core data models for daybook.
//!
//! These types are shared across all daybook crates and represent the core
//! domain entities: insight documents, their extracted records, lifelog
//! entries, and per-user sync bookkeeping.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// EXTRACTION TYPES
// =============================================================================

/// A recurring theme extracted from an insight document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub title: String,
    pub description: String,
}

/// A notable quote with optional attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// A factual nugget with optional category and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeNugget {
    pub fact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One line of dialogue inside a memorable exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub text: String,
}

/// A multi-line conversational exchange with optional trailing context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorableExchange {
    pub dialogue: Vec<DialogueLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Structured record extracted from one insight document.
///
/// Every field is an ordered sequence in document order; all may be empty.
/// The record is a pure function of the document content and date; it is
/// regenerated wholesale on every (re)extraction, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyExtraction {
    /// Content date of the source document.
    pub date: NaiveDate,
    pub action_items: Vec<String>,
    pub decisions: Vec<String>,
    pub ideas: Vec<String>,
    pub questions: Vec<String>,
    pub themes: Vec<Theme>,
    pub quotes: Vec<Quote>,
    pub highlights: Vec<String>,
    pub knowledge_nuggets: Vec<KnowledgeNugget>,
    pub memorable_exchanges: Vec<MemorableExchange>,
}

impl DailyExtraction {
    /// Total number of extracted items across all fields.
    pub fn item_count(&self) -> usize {
        self.action_items.len()
            + self.decisions.len()
            + self.ideas.len()
            + self.questions.len()
            + self.themes.len()
            + self.quotes.len()
            + self.highlights.len()
            + self.knowledge_nuggets.len()
            + self.memorable_exchanges.len()
    }

    /// True when no field captured anything.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// Kind discriminator for persisted derived records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    ActionItem,
    Decision,
    Idea,
    Question,
    Theme,
    Quote,
    Highlight,
    KnowledgeNugget,
    MemorableExchange,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::ActionItem => "action_item",
            RecordKind::Decision => "decision",
            RecordKind::Idea => "idea",
            RecordKind::Question => "question",
            RecordKind::Theme => "theme",
            RecordKind::Quote => "quote",
            RecordKind::Highlight => "highlight",
            RecordKind::KnowledgeNugget => "knowledge_nugget",
            RecordKind::MemorableExchange => "memorable_exchange",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "action_item" => Some(RecordKind::ActionItem),
            "decision" => Some(RecordKind::Decision),
            "idea" => Some(RecordKind::Idea),
            "question" => Some(RecordKind::Question),
            "theme" => Some(RecordKind::Theme),
            "quote" => Some(RecordKind::Quote),
            "highlight" => Some(RecordKind::Highlight),
            "knowledge_nugget" => Some(RecordKind::KnowledgeNugget),
            "memorable_exchange" => Some(RecordKind::MemorableExchange),
            _ => None,
        }
    }

    /// All kinds, in record-assembly order.
    pub fn all() -> &'static [RecordKind] {
        &[
            RecordKind::ActionItem,
            RecordKind::Decision,
            RecordKind::Idea,
            RecordKind::Question,
            RecordKind::Theme,
            RecordKind::Quote,
            RecordKind::Highlight,
            RecordKind::KnowledgeNugget,
            RecordKind::MemorableExchange,
        ]
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// A stored insight document, one per user per date.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub content: String,
    /// `sha256:`-prefixed hex digest of `content`, the change-detection key.
    pub content_hash: String,
    /// Creation instant reported by the remote source.
    pub source_created_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or updating a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub content: String,
    pub source_created_at: Option<DateTime<Utc>>,
}

/// Outcome of a keyed upsert, used for sync counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

// =============================================================================
// DERIVED RECORD TYPES
// =============================================================================

/// One persisted extracted item.
///
/// `payload` holds the serialized item: a bare JSON string for the flat kinds
/// (action items, decisions, ideas, questions, highlights) and a JSON object
/// for the structured kinds (themes, quotes, nuggets, exchanges).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InsightRecord {
    pub id: Uuid,
    pub document_id: Uuid,
    pub kind: String,
    /// Order within the kind, starting at 0.
    pub position: i32,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// LIFELOG TYPES
// =============================================================================

/// Activity category of a lifelog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifelogCategory {
    Meeting,
    Conversation,
    Work,
    Break,
    General,
}

impl LifelogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifelogCategory::Meeting => "meeting",
            LifelogCategory::Conversation => "conversation",
            LifelogCategory::Work => "work",
            LifelogCategory::Break => "break",
            LifelogCategory::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "meeting" => Some(LifelogCategory::Meeting),
            "conversation" => Some(LifelogCategory::Conversation),
            "work" => Some(LifelogCategory::Work),
            "break" => Some(LifelogCategory::Break),
            "general" => Some(LifelogCategory::General),
            _ => None,
        }
    }

    /// Infer a category from entry text when the source provides none.
    ///
    /// Keyword match over the lowercased title and summary, first hit wins;
    /// no hit falls back to `General`.
    pub fn infer(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("meeting") || lower.contains("standup") || lower.contains("sync call") {
            LifelogCategory::Meeting
        } else if lower.contains("conversation")
            || lower.contains("chat")
            || lower.contains("call with")
            || lower.contains("talked")
        {
            LifelogCategory::Conversation
        } else if lower.contains("work") || lower.contains("coding") || lower.contains("review") {
            LifelogCategory::Work
        } else if lower.contains("lunch")
            || lower.contains("coffee")
            || lower.contains("walk")
            || lower.contains("break")
        {
            LifelogCategory::Break
        } else {
            LifelogCategory::General
        }
    }
}

impl std::fmt::Display for LifelogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored lifelog entry, keyed by the source's identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifelogEntry {
    pub id: Uuid,
    pub remote_id: String,
    pub user_id: Uuid,
    /// Local date of the entry, derived from the UTC start instant in the
    /// fixed reference timezone (not the user's preference).
    pub date: NaiveDate,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub markdown_content: Option<String>,
    pub category: LifelogCategory,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized input for creating or updating a lifelog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLifelog {
    pub remote_id: String,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub markdown_content: Option<String>,
    pub category: LifelogCategory,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl NewLifelog {
    /// Whether a stored entry differs from this normalized input on any
    /// compared field.
    pub fn differs_from(&self, existing: &LifelogEntry) -> bool {
        self.title != existing.title
            || self.summary != existing.summary
            || self.markdown_content != existing.markdown_content
            || self.category != existing.category
            || self.started_at != existing.started_at
            || self.ended_at != existing.ended_at
            || self.date != existing.date
    }
}

// =============================================================================
// SYNC STATE TYPES
// =============================================================================

/// Bookkeeping status of the most recent sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No sync has run yet for this user.
    Idle,
    /// A sync invocation is currently between its start and end writes.
    InProgress,
    /// The last attempt completed and recorded its counters.
    Success,
    /// The last attempt failed; `error_message` carries the cause.
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::InProgress => "in_progress",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(SyncStatus::Idle),
            "in_progress" => Some(SyncStatus::InProgress),
            "success" => Some(SyncStatus::Success),
            "error" => Some(SyncStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-user sync cursor and last-run counters. One row per user, created
/// lazily on the first sync attempt and written whole-row at the start and
/// end of every attempt.
///
/// The status is advisory for eligibility decisions, not a lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncState {
    pub user_id: Uuid,
    pub status: SyncStatus,
    pub error_message: Option<String>,
    pub last_full_sync_at: Option<DateTime<Utc>>,
    pub last_insights_sync_at: Option<DateTime<Utc>>,
    pub last_lifelogs_sync_at: Option<DateTime<Utc>>,
    pub insights_fetched: i32,
    pub insights_added: i32,
    pub insights_updated: i32,
    pub lifelogs_fetched: i32,
    pub lifelogs_added: i32,
    pub lifelogs_updated: i32,
    /// Completed insight syncs, ever. Drives the pattern-census cadence.
    pub sync_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl SyncState {
    /// Fresh idle state for a user with no sync history.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            status: SyncStatus::Idle,
            error_message: None,
            last_full_sync_at: None,
            last_insights_sync_at: None,
            last_lifelogs_sync_at: None,
            insights_fetched: 0,
            insights_added: 0,
            insights_updated: 0,
            lifelogs_fetched: 0,
            lifelogs_added: 0,
            lifelogs_updated: 0,
            sync_count: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Answer to "should this user sync now?".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEligibility {
    pub should_sync: bool,
    pub reason: String,
}

// =============================================================================
// SYNC REPORT TYPES
// =============================================================================

/// Result of one insight-document sync invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightSyncReport {
    pub success: bool,
    /// True when the user has no stored credential; not an error.
    pub skipped: bool,
    pub message: String,
    pub fetched: usize,
    pub added: usize,
    pub updated: usize,
}

impl InsightSyncReport {
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: true,
            message: message.into(),
            fetched: 0,
            added: 0,
            updated: 0,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            skipped: false,
            message: message.into(),
            fetched: 0,
            added: 0,
            updated: 0,
        }
    }
}

/// Result of one lifelog sync invocation.
///
/// `skipped` here counts unchanged entries, unlike the credential-skip flag
/// on [`InsightSyncReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifelogSyncReport {
    pub success: bool,
    pub message: String,
    /// Entries newly inserted.
    pub synced: usize,
    pub updated: usize,
    pub skipped: usize,
    pub total_processed: usize,
}

impl LifelogSyncReport {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            synced: 0,
            updated: 0,
            skipped: 0,
            total_processed: 0,
        }
    }
}

/// Result of a bulk re-extraction sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReprocessReport {
    pub processed: usize,
    pub failed: usize,
}

// =============================================================================
// USER SETTINGS TYPES
// =============================================================================

/// Per-user configuration: timezone preference and source credential.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSettings {
    pub user_id: Uuid,
    /// IANA timezone name governing the sync-eligibility window. Lifelog
    /// date derivation uses the fixed reference timezone instead.
    pub timezone: Option<String>,
    pub pendant_api_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// REMOTE WIRE TYPES
// =============================================================================

/// Half-open UTC time window for remote fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window duration in whole seconds (zero when inverted).
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }
}

/// A chat-style summary as reported by the Pendant API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteChatSummary {
    pub id: String,
    /// Source-side label; daily-insight documents carry the insight keyword.
    pub label: Option<String>,
    /// Markdown body of the summary.
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A lifelog entry as reported by the Pendant API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLifelog {
    /// Remote identifier; entries without one cannot be tracked and are
    /// skipped during normalization.
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub markdown: Option<String>,
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}
