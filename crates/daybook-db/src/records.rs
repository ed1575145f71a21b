//! Derived insight record storage.
//!
//! Records are the queryable projection of a document's extraction. They are
//! never edited in place: re-extraction replaces the whole set for a document
//! in one transaction, so readers see either the old projection or the new
//! one, never a mix.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use daybook_core::{
    new_v7, DailyExtraction, Error, InsightRecord, InsightRecordRepository, RecordKind, Result,
};

/// PostgreSQL implementation of InsightRecordRepository.
pub struct PgInsightRecordRepository {
    pool: Pool<Postgres>,
}

impl PgInsightRecordRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Flatten an extraction into `(kind, position, payload)` rows.
    ///
    /// Flat kinds persist as bare JSON strings, structured kinds as objects.
    /// Position restarts at zero for each kind and follows document order.
    pub fn record_rows(extraction: &DailyExtraction) -> Result<Vec<(RecordKind, i32, JsonValue)>> {
        let mut rows = Vec::with_capacity(extraction.item_count());

        push_flat(&mut rows, RecordKind::ActionItem, &extraction.action_items);
        push_flat(&mut rows, RecordKind::Decision, &extraction.decisions);
        push_flat(&mut rows, RecordKind::Idea, &extraction.ideas);
        push_flat(&mut rows, RecordKind::Question, &extraction.questions);
        push_structured(&mut rows, RecordKind::Theme, &extraction.themes)?;
        push_structured(&mut rows, RecordKind::Quote, &extraction.quotes)?;
        push_flat(&mut rows, RecordKind::Highlight, &extraction.highlights);
        push_structured(
            &mut rows,
            RecordKind::KnowledgeNugget,
            &extraction.knowledge_nuggets,
        )?;
        push_structured(
            &mut rows,
            RecordKind::MemorableExchange,
            &extraction.memorable_exchanges,
        )?;

        Ok(rows)
    }
}

fn push_flat(rows: &mut Vec<(RecordKind, i32, JsonValue)>, kind: RecordKind, items: &[String]) {
    for (position, item) in items.iter().enumerate() {
        rows.push((kind, position as i32, JsonValue::String(item.clone())));
    }
}

fn push_structured<T: Serialize>(
    rows: &mut Vec<(RecordKind, i32, JsonValue)>,
    kind: RecordKind,
    items: &[T],
) -> Result<()> {
    for (position, item) in items.iter().enumerate() {
        rows.push((kind, position as i32, serde_json::to_value(item)?));
    }
    Ok(())
}

#[async_trait]
impl InsightRecordRepository for PgInsightRecordRepository {
    async fn replace_for_document(
        &self,
        document_id: Uuid,
        extraction: &DailyExtraction,
    ) -> Result<usize> {
        let rows = Self::record_rows(extraction)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM insight_item WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for (kind, position, payload) in &rows {
            sqlx::query(
                r#"
                INSERT INTO insight_item (id, document_id, kind, position, payload, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(new_v7())
            .bind(document_id)
            .bind(kind.as_str())
            .bind(position)
            .bind(payload)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "database",
            component = "insight_items",
            op = "replace",
            document_id = %document_id,
            item_count = rows.len(),
            "derived records replaced"
        );

        Ok(rows.len())
    }

    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<InsightRecord>> {
        let records = sqlx::query_as::<_, InsightRecord>(
            r#"
            SELECT id, document_id, kind, position, payload, created_at
            FROM insight_item
            WHERE document_id = $1
            ORDER BY kind ASC, position ASC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(records)
    }

    async fn has_records(&self, document_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM insight_item WHERE document_id = $1)",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(exists)
    }

    async fn list_by_kind(
        &self,
        user_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<InsightRecord>> {
        let records = sqlx::query_as::<_, InsightRecord>(
            r#"
            SELECT r.id, r.document_id, r.kind, r.position, r.payload, r.created_at
            FROM insight_item r
            JOIN document d ON d.id = r.document_id
            WHERE d.user_id = $1 AND r.kind = $2
            ORDER BY d.date DESC, r.position ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(records)
    }
}
