//! # daybook-sync
//!
//! Pendant sync orchestration for daybook.
//!
//! This crate provides:
//! - An HTTP client for the Pendant cloud API
//! - Insight and lifelog sync orchestrators with per-user bookkeeping
//! - Eligibility gating against the daily insight generation window
//! - Bulk re-extraction sweeps over stored documents
//! - A background scheduler that sweeps all credentialed users
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use daybook_db::Database;
//! use daybook_sync::{PendantClient, SchedulerConfig, SyncContext, SyncScheduler};
//!
//! let db = Database::connect("postgres://...").await?;
//! let ctx = SyncContext::from_database(&db, Arc::new(PendantClient::from_env()));
//!
//! // One-off sync for a user
//! let report = daybook_sync::sync_insights(&ctx, user_id, Default::default()).await;
//! println!("{}", report.message);
//!
//! // Or run the periodic sweep
//! let handle = SyncScheduler::new(ctx, SchedulerConfig::from_env()).start();
//! handle.shutdown().await?;
//! ```

pub mod insights;
pub mod lifelogs;
pub mod mock;
pub mod remote;
pub mod reprocess;
pub mod scheduler;
pub mod status;

use std::sync::Arc;

use daybook_db::{
    Database, PgDocumentRepository, PgInsightRecordRepository, PgLifelogRepository,
    PgSyncStateRepository, PgUserSettingsRepository,
};

// Re-export core types
pub use daybook_core::*;

// Re-export sync entry points
pub use insights::{sync_insights, InsightSyncOptions};
pub use lifelogs::{sync_lifelogs, LifelogSyncOptions};
pub use remote::PendantClient;
pub use reprocess::{reprocess_all, reprocess_date, reprocess_range};
pub use scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler};
pub use status::sync_eligibility;

/// Everything a sync run needs, behind trait objects.
///
/// Orchestrators take this instead of concrete repositories so tests can
/// swap in [`mock::MemoryStore`] and [`mock::MockPendantSource`] without a
/// database or network.
#[derive(Clone)]
pub struct SyncContext {
    /// Insight document repository.
    pub documents: Arc<dyn DocumentRepository>,
    /// Derived insight record repository.
    pub records: Arc<dyn InsightRecordRepository>,
    /// Lifelog transcript repository.
    pub lifelogs: Arc<dyn LifelogRepository>,
    /// Per-user sync bookkeeping repository.
    pub sync_state: Arc<dyn SyncStateRepository>,
    /// Per-user settings repository.
    pub users: Arc<dyn UserSettingsRepository>,
    /// Remote Pendant API.
    pub source: Arc<dyn PendantSource>,
}

impl SyncContext {
    /// Build a context backed by the Postgres repositories of a [`Database`].
    pub fn from_database(db: &Database, source: Arc<dyn PendantSource>) -> Self {
        Self {
            documents: Arc::new(PgDocumentRepository::new(db.pool.clone())),
            records: Arc::new(PgInsightRecordRepository::new(db.pool.clone())),
            lifelogs: Arc::new(PgLifelogRepository::new(db.pool.clone())),
            sync_state: Arc::new(PgSyncStateRepository::new(db.pool.clone())),
            users: Arc::new(PgUserSettingsRepository::new(db.pool.clone())),
            source,
        }
    }
}
