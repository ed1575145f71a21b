//! Bulk re-extraction of stored documents.
//!
//! Extraction is idempotent on `(content, date)`, so a sweep can nuke and
//! rewrite every document's derived rows after an extractor change without
//! touching the documents themselves. One bad document is counted and
//! logged, never aborts the sweep.

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use daybook_core::{defaults, Document, ReprocessReport, Result};
use daybook_extract::extract;

use crate::SyncContext;

/// Re-extract every stored document for a user.
#[instrument(skip(ctx))]
pub async fn reprocess_all(ctx: &SyncContext, user_id: Uuid) -> Result<ReprocessReport> {
    let documents = ctx
        .documents
        .list_for_user(user_id, defaults::INTERNAL_FETCH_LIMIT)
        .await?;
    Ok(reprocess_documents(ctx, documents).await)
}

/// Re-extract a single day's document, if stored.
#[instrument(skip(ctx))]
pub async fn reprocess_date(
    ctx: &SyncContext,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<ReprocessReport> {
    let documents = match ctx.documents.get(user_id, date).await? {
        Some(document) => vec![document],
        None => Vec::new(),
    };
    Ok(reprocess_documents(ctx, documents).await)
}

/// Re-extract documents within an inclusive date range.
#[instrument(skip(ctx))]
pub async fn reprocess_range(
    ctx: &SyncContext,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<ReprocessReport> {
    let documents = ctx.documents.list_range(user_id, from, to).await?;
    Ok(reprocess_documents(ctx, documents).await)
}

async fn reprocess_documents(ctx: &SyncContext, documents: Vec<Document>) -> ReprocessReport {
    let mut report = ReprocessReport::default();
    for document in documents {
        match rederive(ctx, &document).await {
            Ok(count) => {
                report.processed += 1;
                debug!(
                    document_id = %document.id,
                    doc_date = %document.date,
                    item_count = count,
                    "Reprocessed document"
                );
            }
            Err(e) => {
                report.failed += 1;
                warn!(
                    error = %e,
                    document_id = %document.id,
                    doc_date = %document.date,
                    "Reprocess failed for document"
                );
            }
        }
    }
    info!(
        processed = report.processed,
        failed = report.failed,
        "Reprocess sweep complete"
    );
    report
}

async fn rederive(ctx: &SyncContext, document: &Document) -> Result<usize> {
    let extraction = extract(&document.content, document.date)?;
    ctx.records
        .replace_for_document(document.id, &extraction)
        .await
}
