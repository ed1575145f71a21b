//! # daybook-db
//!
//! PostgreSQL storage layer for daybook.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for documents, derived insight records,
//!   lifelogs, sync state, and user settings
//!
//! ## Example
//!
//! ```rust,ignore
//! use daybook_db::{Database, DocumentRepository};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/daybook").await?;
//!
//!     let documents = db.documents.list_for_user(Uuid::new_v4(), 10).await?;
//!     println!("{} documents", documents.len());
//!     Ok(())
//! }
//! ```
pub mod documents;
pub mod lifelogs;
pub mod pool;
pub mod records;
pub mod sync_state;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use daybook_core::*;

// Re-export repository implementations
pub use documents::PgDocumentRepository;
pub use lifelogs::PgLifelogRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use records::PgInsightRecordRepository;
pub use sync_state::PgSyncStateRepository;
pub use users::PgUserSettingsRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Insight document repository.
    pub documents: PgDocumentRepository,
    /// Derived insight record repository.
    pub records: PgInsightRecordRepository,
    /// Lifelog transcript repository.
    pub lifelogs: PgLifelogRepository,
    /// Per-user sync bookkeeping repository.
    pub sync_state: PgSyncStateRepository,
    /// Per-user settings repository.
    pub users: PgUserSettingsRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            documents: PgDocumentRepository::new(pool.clone()),
            records: PgInsightRecordRepository::new(pool.clone()),
            lifelogs: PgLifelogRepository::new(pool.clone()),
            sync_state: PgSyncStateRepository::new(pool.clone()),
            users: PgUserSettingsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
