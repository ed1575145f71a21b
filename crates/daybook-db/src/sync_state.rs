//! Per-user sync bookkeeping.
//!
//! One row per user. The sync orchestrator writes the whole row at the start
//! and end of each run; counters describe the most recent completed run, not
//! lifetime totals. `sync_count` is the only cumulative column.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use daybook_core::{Error, Result, SyncState, SyncStateRepository, SyncStatus};

/// PostgreSQL implementation of SyncStateRepository.
pub struct PgSyncStateRepository {
    pool: Pool<Postgres>,
}

impl PgSyncStateRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map a database row to a SyncState.
fn parse_state_row(row: PgRow) -> SyncState {
    let status = SyncStatus::parse(row.get("status")).unwrap_or(SyncStatus::Idle);

    SyncState {
        user_id: row.get("user_id"),
        status,
        error_message: row.get("error_message"),
        last_full_sync_at: row.get("last_full_sync_at"),
        last_insights_sync_at: row.get("last_insights_sync_at"),
        last_lifelogs_sync_at: row.get("last_lifelogs_sync_at"),
        insights_fetched: row.get("insights_fetched"),
        insights_added: row.get("insights_added"),
        insights_updated: row.get("insights_updated"),
        lifelogs_fetched: row.get("lifelogs_fetched"),
        lifelogs_added: row.get("lifelogs_added"),
        lifelogs_updated: row.get("lifelogs_updated"),
        sync_count: row.get("sync_count"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl SyncStateRepository for PgSyncStateRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<SyncState>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, status, error_message, last_full_sync_at,
                   last_insights_sync_at, last_lifelogs_sync_at,
                   insights_fetched, insights_added, insights_updated,
                   lifelogs_fetched, lifelogs_added, lifelogs_updated,
                   sync_count, updated_at
            FROM sync_state
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(parse_state_row))
    }

    async fn get_or_create(&self, user_id: Uuid) -> Result<SyncState> {
        if let Some(state) = self.get(user_id).await? {
            return Ok(state);
        }

        let fresh = SyncState::new(user_id);
        sqlx::query(
            r#"
            INSERT INTO sync_state (user_id, status, error_message, last_full_sync_at,
                                    last_insights_sync_at, last_lifelogs_sync_at,
                                    insights_fetched, insights_added, insights_updated,
                                    lifelogs_fetched, lifelogs_added, lifelogs_updated,
                                    sync_count, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(fresh.user_id)
        .bind(fresh.status.as_str())
        .bind(&fresh.error_message)
        .bind(fresh.last_full_sync_at)
        .bind(fresh.last_insights_sync_at)
        .bind(fresh.last_lifelogs_sync_at)
        .bind(fresh.insights_fetched)
        .bind(fresh.insights_added)
        .bind(fresh.insights_updated)
        .bind(fresh.lifelogs_fetched)
        .bind(fresh.lifelogs_added)
        .bind(fresh.lifelogs_updated)
        .bind(fresh.sync_count)
        .bind(fresh.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        // Re-read instead of returning `fresh`: a concurrent creator may have
        // won the conflict with different contents.
        self.get(user_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("sync state missing after insert: {user_id}")))
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_state (user_id, status, error_message, last_full_sync_at,
                                    last_insights_sync_at, last_lifelogs_sync_at,
                                    insights_fetched, insights_added, insights_updated,
                                    lifelogs_fetched, lifelogs_added, lifelogs_updated,
                                    sync_count, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (user_id) DO UPDATE SET
                status = EXCLUDED.status,
                error_message = EXCLUDED.error_message,
                last_full_sync_at = EXCLUDED.last_full_sync_at,
                last_insights_sync_at = EXCLUDED.last_insights_sync_at,
                last_lifelogs_sync_at = EXCLUDED.last_lifelogs_sync_at,
                insights_fetched = EXCLUDED.insights_fetched,
                insights_added = EXCLUDED.insights_added,
                insights_updated = EXCLUDED.insights_updated,
                lifelogs_fetched = EXCLUDED.lifelogs_fetched,
                lifelogs_added = EXCLUDED.lifelogs_added,
                lifelogs_updated = EXCLUDED.lifelogs_updated,
                sync_count = EXCLUDED.sync_count,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(state.user_id)
        .bind(state.status.as_str())
        .bind(&state.error_message)
        .bind(state.last_full_sync_at)
        .bind(state.last_insights_sync_at)
        .bind(state.last_lifelogs_sync_at)
        .bind(state.insights_fetched)
        .bind(state.insights_added)
        .bind(state.insights_updated)
        .bind(state.lifelogs_fetched)
        .bind(state.lifelogs_added)
        .bind(state.lifelogs_updated)
        .bind(state.sync_count)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn increment_sync_count(&self, user_id: Uuid) -> Result<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE sync_state
            SET sync_count = sync_count + 1, updated_at = $2
            WHERE user_id = $1
            RETURNING sync_count
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        count.ok_or_else(|| Error::NotFound(format!("sync state for user {user_id}")))
    }
}
