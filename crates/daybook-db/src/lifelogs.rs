//! Lifelog transcript storage.
//!
//! Entries are keyed by the remote source's stable identifier, so repeated
//! sync windows converge on one row per remote entry no matter how often the
//! windows overlap.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use daybook_core::{
    new_v7, Error, LifelogCategory, LifelogEntry, LifelogRepository, NewLifelog, Result,
    UpsertOutcome,
};

/// PostgreSQL implementation of LifelogRepository.
pub struct PgLifelogRepository {
    pool: Pool<Postgres>,
}

impl PgLifelogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map a database row to a LifelogEntry.
fn parse_lifelog_row(row: PgRow) -> LifelogEntry {
    // Unknown category strings from older rows degrade to General.
    let category =
        LifelogCategory::parse(row.get("category")).unwrap_or(LifelogCategory::General);

    LifelogEntry {
        id: row.get("id"),
        remote_id: row.get("remote_id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        title: row.get("title"),
        summary: row.get("summary"),
        markdown_content: row.get("markdown_content"),
        category,
        started_at: row.get("started_at"),
        ended_at: row.get("ended_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl LifelogRepository for PgLifelogRepository {
    async fn upsert(&self, entry: NewLifelog, force: bool) -> Result<UpsertOutcome> {
        let now = Utc::now();

        let existing = self.get_by_remote_id(&entry.remote_id).await?;
        match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO lifelog (id, remote_id, user_id, date, title, summary,
                                         markdown_content, category, started_at, ended_at,
                                         created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    "#,
                )
                .bind(new_v7())
                .bind(&entry.remote_id)
                .bind(entry.user_id)
                .bind(entry.date)
                .bind(&entry.title)
                .bind(&entry.summary)
                .bind(&entry.markdown_content)
                .bind(entry.category.as_str())
                .bind(entry.started_at)
                .bind(entry.ended_at)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

                Ok(UpsertOutcome::Inserted)
            }
            Some(current) if !force && !entry.differs_from(&current) => {
                Ok(UpsertOutcome::Unchanged)
            }
            Some(current) => {
                sqlx::query(
                    r#"
                    UPDATE lifelog
                    SET date = $1, title = $2, summary = $3, markdown_content = $4,
                        category = $5, started_at = $6, ended_at = $7, updated_at = $8
                    WHERE id = $9
                    "#,
                )
                .bind(entry.date)
                .bind(&entry.title)
                .bind(&entry.summary)
                .bind(&entry.markdown_content)
                .bind(entry.category.as_str())
                .bind(entry.started_at)
                .bind(entry.ended_at)
                .bind(now)
                .bind(current.id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

                Ok(UpsertOutcome::Updated)
            }
        }
    }

    async fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<LifelogEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, remote_id, user_id, date, title, summary, markdown_content,
                   category, started_at, ended_at, created_at, updated_at
            FROM lifelog
            WHERE remote_id = $1
            "#,
        )
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(parse_lifelog_row))
    }

    async fn list_for_date(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<LifelogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, remote_id, user_id, date, title, summary, markdown_content,
                   category, started_at, ended_at, created_at, updated_at
            FROM lifelog
            WHERE user_id = $1 AND date = $2
            ORDER BY started_at ASC
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_lifelog_row).collect())
    }

    async fn list_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LifelogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, remote_id, user_id, date, title, summary, markdown_content,
                   category, started_at, ended_at, created_at, updated_at
            FROM lifelog
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC, started_at ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_lifelog_row).collect())
    }
}
