//! Insight document storage.
//!
//! Documents are keyed by `(user_id, date)`; one markdown document per user
//! per day. Upserts are hash-gated so re-syncing an unchanged day is a no-op
//! and downstream re-extraction only runs when content actually moved.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use daybook_core::{
    new_v7, Document, DocumentRepository, Error, NewDocument, Result, UpsertOutcome,
};

/// PostgreSQL implementation of DocumentRepository.
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Hash document content for change detection.
    pub fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn upsert(&self, doc: NewDocument) -> Result<(Document, UpsertOutcome)> {
        let content_hash = Self::hash_content(&doc.content);
        let now = Utc::now();

        let existing = self.get(doc.user_id, doc.date).await?;
        match existing {
            None => {
                let inserted = sqlx::query_as::<_, Document>(
                    r#"
                    INSERT INTO document (id, user_id, date, content, content_hash,
                                          source_created_at, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING id, user_id, date, content, content_hash,
                              source_created_at, created_at, updated_at
                    "#,
                )
                .bind(new_v7())
                .bind(doc.user_id)
                .bind(doc.date)
                .bind(&doc.content)
                .bind(&content_hash)
                .bind(doc.source_created_at)
                .bind(now)
                .bind(now)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

                tracing::debug!(
                    subsystem = "database",
                    component = "documents",
                    op = "upsert",
                    document_id = %inserted.id,
                    date = %inserted.date,
                    "document inserted"
                );
                Ok((inserted, UpsertOutcome::Inserted))
            }
            Some(current) if current.content_hash == content_hash => {
                Ok((current, UpsertOutcome::Unchanged))
            }
            Some(current) => {
                let updated = sqlx::query_as::<_, Document>(
                    r#"
                    UPDATE document
                    SET content = $1, content_hash = $2, source_created_at = $3, updated_at = $4
                    WHERE id = $5
                    RETURNING id, user_id, date, content, content_hash,
                              source_created_at, created_at, updated_at
                    "#,
                )
                .bind(&doc.content)
                .bind(&content_hash)
                .bind(doc.source_created_at)
                .bind(now)
                .bind(current.id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

                tracing::debug!(
                    subsystem = "database",
                    component = "documents",
                    op = "upsert",
                    document_id = %updated.id,
                    date = %updated.date,
                    "document content changed"
                );
                Ok((updated, UpsertOutcome::Updated))
            }
        }
    }

    async fn get(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, date, content, content_hash,
                   source_created_at, created_at, updated_at
            FROM document
            WHERE user_id = $1 AND date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(document)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, date, content, content_hash,
                   source_created_at, created_at, updated_at
            FROM document
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        document.ok_or(Error::DocumentNotFound(id))
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, date, content, content_hash,
                   source_created_at, created_at, updated_at
            FROM document
            WHERE user_id = $1
            ORDER BY date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(documents)
    }

    async fn list_range(&self, user_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, date, content, content_hash,
                   source_created_at, created_at, updated_at
            FROM document
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(documents)
    }

    async fn list_missing_records(&self, user_id: Uuid) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT d.id, d.user_id, d.date, d.content, d.content_hash,
                   d.source_created_at, d.created_at, d.updated_at
            FROM document d
            WHERE d.user_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM insight_item r WHERE r.document_id = d.id
              )
            ORDER BY d.date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(documents)
    }

    async fn recent_contents(&self, user_id: Uuid, limit: i64) -> Result<Vec<String>> {
        let contents: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT content
            FROM document
            WHERE user_id = $1
            ORDER BY date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(contents)
    }
}
