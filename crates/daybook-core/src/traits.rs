//! Core traits for daybook abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

/// Repository for insight documents, keyed by `(user_id, date)`.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert or update by key with content-hash change detection.
    ///
    /// Unchanged content returns the stored row with
    /// [`UpsertOutcome::Unchanged`] and writes nothing.
    async fn upsert(&self, doc: NewDocument) -> Result<(Document, UpsertOutcome)>;

    /// Fetch a document by key.
    async fn get(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Document>>;

    /// Fetch a document by ID.
    async fn get_by_id(&self, id: Uuid) -> Result<Document>;

    /// List a user's documents, newest date first.
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Document>>;

    /// List a user's documents within an inclusive date range, oldest first.
    async fn list_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Document>>;

    /// List documents that have no derived records yet.
    /// Used for partial-failure recovery after sync.
    async fn list_missing_records(&self, user_id: Uuid) -> Result<Vec<Document>>;

    /// Raw content of the user's most recent documents, for the
    /// recurring-header census.
    async fn recent_contents(&self, user_id: Uuid, limit: i64) -> Result<Vec<String>>;
}

// =============================================================================
// DERIVED RECORD REPOSITORY
// =============================================================================

/// Repository for extracted insight records.
#[async_trait]
pub trait InsightRecordRepository: Send + Sync {
    /// Replace all records for a document in one transaction.
    /// Returns the number of rows written.
    async fn replace_for_document(
        &self,
        document_id: Uuid,
        extraction: &DailyExtraction,
    ) -> Result<usize>;

    /// List a document's records ordered by kind and position.
    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<InsightRecord>>;

    /// Whether any records exist for a document.
    async fn has_records(&self, document_id: Uuid) -> Result<bool>;

    /// List a user's records of one kind across documents, newest date first.
    async fn list_by_kind(
        &self,
        user_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<InsightRecord>>;
}

// =============================================================================
// LIFELOG REPOSITORY
// =============================================================================

/// Repository for lifelog entries, keyed by the remote identifier.
#[async_trait]
pub trait LifelogRepository: Send + Sync {
    /// Insert a new entry, or update an existing one when any compared field
    /// differs (or `force` is set). Unchanged entries write nothing.
    async fn upsert(&self, entry: NewLifelog, force: bool) -> Result<UpsertOutcome>;

    /// Fetch an entry by remote identifier.
    async fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<LifelogEntry>>;

    /// List a user's entries for one local date, by start time.
    async fn list_for_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<LifelogEntry>>;

    /// List a user's entries within an inclusive date range, by start time.
    async fn list_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LifelogEntry>>;
}

// =============================================================================
// SYNC STATE REPOSITORY
// =============================================================================

/// Repository for per-user sync bookkeeping.
#[async_trait]
pub trait SyncStateRepository: Send + Sync {
    /// Fetch a user's sync state.
    async fn get(&self, user_id: Uuid) -> Result<Option<SyncState>>;

    /// Fetch a user's sync state, creating an idle row if none exists.
    async fn get_or_create(&self, user_id: Uuid) -> Result<SyncState>;

    /// Write the whole row.
    async fn save(&self, state: &SyncState) -> Result<()>;

    /// Increment the persistent sync counter and return the new value.
    async fn increment_sync_count(&self, user_id: Uuid) -> Result<i64>;
}

// =============================================================================
// USER SETTINGS REPOSITORY
// =============================================================================

/// Repository for per-user configuration.
#[async_trait]
pub trait UserSettingsRepository: Send + Sync {
    /// Fetch settings for a user.
    async fn get(&self, user_id: Uuid) -> Result<Option<UserSettings>>;

    /// Create or update settings for a user. `None` fields clear the value.
    async fn upsert(
        &self,
        user_id: Uuid,
        timezone: Option<&str>,
        pendant_api_key: Option<&str>,
    ) -> Result<UserSettings>;

    /// Users holding a source credential, the scheduler's work list.
    async fn list_with_credentials(&self) -> Result<Vec<UserSettings>>;
}

// =============================================================================
// REMOTE SOURCE
// =============================================================================

/// Read-only client for the Pendant wearable API.
#[async_trait]
pub trait PendantSource: Send + Sync {
    /// Fetch chat-style summaries created within the window, all pages.
    async fn fetch_chat_summaries(
        &self,
        api_key: &str,
        window: FetchWindow,
    ) -> Result<Vec<RemoteChatSummary>>;

    /// Fetch lifelog entries started within the window, all pages.
    async fn fetch_lifelogs(&self, api_key: &str, window: FetchWindow)
        -> Result<Vec<RemoteLifelog>>;
}
