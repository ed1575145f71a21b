//! Deterministic fakes for sync testing.
//!
//! [`MockPendantSource`] serves scripted remote payloads and records every
//! call; [`MemoryStore`] implements all five repository traits over shared
//! in-process maps, mirroring the Postgres semantics (hash gating, wholesale
//! record replacement, field-compare lifelog upserts).
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use daybook_sync::mock::{MemoryStore, MockPendantSource};
//!
//! let store = MemoryStore::default();
//! let source = MockPendantSource::new().with_chat_summary_failure();
//! let ctx = store.clone().into_context(Arc::new(source));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use daybook_core::{
    new_v7, DailyExtraction, Document, DocumentRepository, Error, FetchWindow, InsightRecord,
    InsightRecordRepository, LifelogEntry, LifelogRepository, NewDocument, NewLifelog,
    PendantSource, RecordKind, RemoteChatSummary, RemoteLifelog, Result, SyncState,
    SyncStateRepository, UpsertOutcome, UserSettings, UserSettingsRepository,
};
use daybook_db::{PgDocumentRepository, PgInsightRecordRepository};

use crate::SyncContext;

// =============================================================================
// MOCK PENDANT SOURCE
// =============================================================================

/// Mock Pendant source for testing.
///
/// Scripted entries are filtered by the requested window, like the real API.
#[derive(Clone)]
pub struct MockPendantSource {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    chat_summaries: Vec<RemoteChatSummary>,
    lifelogs: Vec<RemoteLifelog>,
    fail_chat_summaries: bool,
    fail_lifelogs: bool,
}

/// One recorded fetch call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub api_key: String,
    pub window: FetchWindow,
}

impl MockPendantSource {
    /// Create a new mock source with no scripted data.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the chat summaries the source serves.
    pub fn with_chat_summaries(mut self, summaries: Vec<RemoteChatSummary>) -> Self {
        Arc::make_mut(&mut self.config).chat_summaries = summaries;
        self
    }

    /// Script the lifelog entries the source serves.
    pub fn with_lifelogs(mut self, lifelogs: Vec<RemoteLifelog>) -> Self {
        Arc::make_mut(&mut self.config).lifelogs = lifelogs;
        self
    }

    /// Make chat summary fetches fail with a request error.
    pub fn with_chat_summary_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_chat_summaries = true;
        self
    }

    /// Make lifelog fetches fail with a request error.
    pub fn with_lifelog_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_lifelogs = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls to one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }
}

impl Default for MockPendantSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendantSource for MockPendantSource {
    async fn fetch_chat_summaries(
        &self,
        api_key: &str,
        window: FetchWindow,
    ) -> Result<Vec<RemoteChatSummary>> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: "fetch_chat_summaries".to_string(),
            api_key: api_key.to_string(),
            window,
        });
        if self.config.fail_chat_summaries {
            return Err(Error::Request("mock chat summary failure".to_string()));
        }
        Ok(self
            .config
            .chat_summaries
            .iter()
            .filter(|s| s.created_at >= window.start && s.created_at < window.end)
            .cloned()
            .collect())
    }

    async fn fetch_lifelogs(
        &self,
        api_key: &str,
        window: FetchWindow,
    ) -> Result<Vec<RemoteLifelog>> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: "fetch_lifelogs".to_string(),
            api_key: api_key.to_string(),
            window,
        });
        if self.config.fail_lifelogs {
            return Err(Error::Request("mock lifelog failure".to_string()));
        }
        Ok(self
            .config
            .lifelogs
            .iter()
            .filter(|l| l.started_at >= window.start && l.started_at < window.end)
            .cloned()
            .collect())
    }
}

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

/// In-memory repository bundle for tests.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the orchestrators work through a [`SyncContext`] built from another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    documents: HashMap<Uuid, Document>,
    records: HashMap<Uuid, Vec<InsightRecord>>,
    lifelogs: HashMap<String, LifelogEntry>,
    sync_states: HashMap<Uuid, SyncState>,
    settings: HashMap<Uuid, UserSettings>,
    fail_replace_for: Option<Uuid>,
}

impl MemoryStore {
    /// Build a [`SyncContext`] whose repositories all share this store.
    pub fn into_context(self, source: Arc<dyn PendantSource>) -> SyncContext {
        SyncContext {
            documents: Arc::new(self.clone()),
            records: Arc::new(self.clone()),
            lifelogs: Arc::new(self.clone()),
            sync_state: Arc::new(self.clone()),
            users: Arc::new(self),
            source,
        }
    }

    /// Poison record replacement for one document, for failure-path tests.
    pub fn fail_replace_for(&self, document_id: Uuid) {
        self.inner.lock().unwrap().fail_replace_for = Some(document_id);
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn upsert(&self, doc: NewDocument) -> Result<(Document, UpsertOutcome)> {
        let content_hash = PgDocumentRepository::hash_content(&doc.content);
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        let existing = inner
            .documents
            .values()
            .find(|d| d.user_id == doc.user_id && d.date == doc.date)
            .cloned();
        match existing {
            None => {
                let document = Document {
                    id: new_v7(),
                    user_id: doc.user_id,
                    date: doc.date,
                    content: doc.content,
                    content_hash,
                    source_created_at: doc.source_created_at,
                    created_at: now,
                    updated_at: now,
                };
                inner.documents.insert(document.id, document.clone());
                Ok((document, UpsertOutcome::Inserted))
            }
            Some(current) if current.content_hash == content_hash => {
                Ok((current, UpsertOutcome::Unchanged))
            }
            Some(mut document) => {
                document.content = doc.content;
                document.content_hash = content_hash;
                document.source_created_at = doc.source_created_at;
                document.updated_at = now;
                inner.documents.insert(document.id, document.clone());
                Ok((document, UpsertOutcome::Updated))
            }
        }
    }

    async fn get(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Document>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .documents
            .values()
            .find(|d| d.user_id == user_id && d.date == date)
            .cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Document> {
        let inner = self.inner.lock().unwrap();
        inner
            .documents
            .get(&id)
            .cloned()
            .ok_or(Error::DocumentNotFound(id))
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Document>> {
        let inner = self.inner.lock().unwrap();
        let mut docs: Vec<Document> = inner
            .documents
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.date.cmp(&a.date));
        docs.truncate(limit.max(0) as usize);
        Ok(docs)
    }

    async fn list_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Document>> {
        let inner = self.inner.lock().unwrap();
        let mut docs: Vec<Document> = inner
            .documents
            .values()
            .filter(|d| d.user_id == user_id && d.date >= from && d.date <= to)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(docs)
    }

    async fn list_missing_records(&self, user_id: Uuid) -> Result<Vec<Document>> {
        let inner = self.inner.lock().unwrap();
        let mut docs: Vec<Document> = inner
            .documents
            .values()
            .filter(|d| d.user_id == user_id)
            .filter(|d| inner.records.get(&d.id).map_or(true, |r| r.is_empty()))
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(docs)
    }

    async fn recent_contents(&self, user_id: Uuid, limit: i64) -> Result<Vec<String>> {
        let docs = self.list_for_user(user_id, limit).await?;
        Ok(docs.into_iter().map(|d| d.content).collect())
    }
}

#[async_trait]
impl InsightRecordRepository for MemoryStore {
    async fn replace_for_document(
        &self,
        document_id: Uuid,
        extraction: &DailyExtraction,
    ) -> Result<usize> {
        let rows = PgInsightRecordRepository::record_rows(extraction)?;
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_replace_for == Some(document_id) {
            return Err(Error::Internal(
                "record replacement poisoned for test".to_string(),
            ));
        }
        let records: Vec<InsightRecord> = rows
            .into_iter()
            .map(|(kind, position, payload)| InsightRecord {
                id: new_v7(),
                document_id,
                kind: kind.as_str().to_string(),
                position,
                payload,
                created_at: now,
            })
            .collect();
        let count = records.len();
        inner.records.insert(document_id, records);
        Ok(count)
    }

    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<InsightRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut records = inner.records.get(&document_id).cloned().unwrap_or_default();
        records.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.position.cmp(&b.position)));
        Ok(records)
    }

    async fn has_records(&self, document_id: Uuid) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .get(&document_id)
            .map_or(false, |r| !r.is_empty()))
    }

    async fn list_by_kind(
        &self,
        user_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<InsightRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<(NaiveDate, InsightRecord)> = Vec::new();
        for (document_id, records) in &inner.records {
            let Some(document) = inner.documents.get(document_id) else {
                continue;
            };
            if document.user_id != user_id {
                continue;
            }
            for record in records {
                if record.kind == kind.as_str() {
                    rows.push((document.date, record.clone()));
                }
            }
        }
        rows.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.position.cmp(&b.1.position)));
        Ok(rows
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, record)| record)
            .collect())
    }
}

#[async_trait]
impl LifelogRepository for MemoryStore {
    async fn upsert(&self, entry: NewLifelog, force: bool) -> Result<UpsertOutcome> {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        match inner.lifelogs.get(&entry.remote_id).cloned() {
            None => {
                let stored = LifelogEntry {
                    id: new_v7(),
                    remote_id: entry.remote_id.clone(),
                    user_id: entry.user_id,
                    date: entry.date,
                    title: entry.title,
                    summary: entry.summary,
                    markdown_content: entry.markdown_content,
                    category: entry.category,
                    started_at: entry.started_at,
                    ended_at: entry.ended_at,
                    created_at: now,
                    updated_at: now,
                };
                inner.lifelogs.insert(entry.remote_id, stored);
                Ok(UpsertOutcome::Inserted)
            }
            Some(current) if !force && !entry.differs_from(&current) => {
                Ok(UpsertOutcome::Unchanged)
            }
            Some(mut stored) => {
                stored.date = entry.date;
                stored.title = entry.title;
                stored.summary = entry.summary;
                stored.markdown_content = entry.markdown_content;
                stored.category = entry.category;
                stored.started_at = entry.started_at;
                stored.ended_at = entry.ended_at;
                stored.updated_at = now;
                inner.lifelogs.insert(entry.remote_id, stored);
                Ok(UpsertOutcome::Updated)
            }
        }
    }

    async fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<LifelogEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.lifelogs.get(remote_id).cloned())
    }

    async fn list_for_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<LifelogEntry>> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<LifelogEntry> = inner
            .lifelogs
            .values()
            .filter(|l| l.user_id == user_id && l.date == date)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(entries)
    }

    async fn list_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LifelogEntry>> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<LifelogEntry> = inner
            .lifelogs
            .values()
            .filter(|l| l.user_id == user_id && l.date >= from && l.date <= to)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.started_at.cmp(&b.started_at)));
        Ok(entries)
    }
}

#[async_trait]
impl SyncStateRepository for MemoryStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<SyncState>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sync_states.get(&user_id).cloned())
    }

    async fn get_or_create(&self, user_id: Uuid) -> Result<SyncState> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .sync_states
            .entry(user_id)
            .or_insert_with(|| SyncState::new(user_id))
            .clone())
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.sync_states.insert(state.user_id, state.clone());
        Ok(())
    }

    async fn increment_sync_count(&self, user_id: Uuid) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        let state = inner
            .sync_states
            .get_mut(&user_id)
            .ok_or_else(|| Error::NotFound(format!("sync state for user {user_id}")))?;
        state.sync_count += 1;
        state.updated_at = Utc::now();
        Ok(state.sync_count)
    }
}

#[async_trait]
impl UserSettingsRepository for MemoryStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserSettings>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.settings.get(&user_id).cloned())
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        timezone: Option<&str>,
        pendant_api_key: Option<&str>,
    ) -> Result<UserSettings> {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        let created_at = inner
            .settings
            .get(&user_id)
            .map(|s| s.created_at)
            .unwrap_or(now);
        let settings = UserSettings {
            user_id,
            timezone: timezone.map(String::from),
            pendant_api_key: pendant_api_key.map(String::from),
            created_at,
            updated_at: now,
        };
        inner.settings.insert(user_id, settings.clone());
        Ok(settings)
    }

    async fn list_with_credentials(&self) -> Result<Vec<UserSettings>> {
        let inner = self.inner.lock().unwrap();
        let mut users: Vec<UserSettings> = inner
            .settings
            .values()
            .filter(|s| s.pendant_api_key.is_some())
            .cloned()
            .collect();
        users.sort_by_key(|s| s.user_id);
        Ok(users)
    }
}
