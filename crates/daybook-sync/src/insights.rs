//! Insight document sync.
//!
//! Pulls daily-insight chat summaries from the Pendant API, stores the
//! markdown keyed by `(user, date)`, and projects each new or changed
//! document into derived records. Per-item upserts commit independently: a
//! failure mid-run keeps the items already written and is recorded in sync
//! bookkeeping, never rolled back.

use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use daybook_core::{
    defaults, FetchWindow, InsightSyncReport, NewDocument, Result, ScanPolicy, SyncState,
    SyncStatus, UpsertOutcome,
};
use daybook_extract::{extract, scan_recurring_headers};

use crate::SyncContext;

/// Options for one insight sync invocation.
#[derive(Debug, Clone)]
pub struct InsightSyncOptions {
    /// Refetch the full lookback window instead of resuming from the last
    /// successful sync. Stored documents with unchanged content still skip.
    pub force: bool,
    /// Window size for forced syncs, in days.
    pub lookback_days: i64,
    /// When the recurring-header census runs.
    pub scan_policy: ScanPolicy,
}

impl Default for InsightSyncOptions {
    fn default() -> Self {
        Self {
            force: false,
            lookback_days: defaults::INSIGHT_LOOKBACK_DAYS,
            scan_policy: ScanPolicy::EveryNth(defaults::PATTERN_SCAN_EVERY),
        }
    }
}

impl InsightSyncOptions {
    /// Create options from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_LOOKBACK_DAYS` | `30` | Window size for forced full syncs |
    /// | `PATTERN_SCAN_EVERY` | `5` | Census cadence; `0` disables |
    pub fn from_env() -> Self {
        let lookback_days = std::env::var(defaults::ENV_SYNC_LOOKBACK_DAYS)
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults::INSIGHT_LOOKBACK_DAYS);

        Self {
            force: false,
            lookback_days,
            scan_policy: ScanPolicy::from_env(),
        }
    }

    /// Request a forced full sync.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the forced-sync lookback window.
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    /// Set the census policy.
    pub fn with_scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.scan_policy = policy;
        self
    }
}

/// Sync insight documents for one user.
///
/// Callable standalone; the scheduler is just one caller. A missing
/// credential returns a skipped report. Failures are folded into the report
/// after being written to sync bookkeeping.
#[instrument(skip(ctx, options))]
pub async fn sync_insights(
    ctx: &SyncContext,
    user_id: Uuid,
    options: InsightSyncOptions,
) -> InsightSyncReport {
    let api_key = match resolve_credential(ctx, user_id).await {
        Ok(Some(key)) => key,
        Ok(None) => {
            debug!(%user_id, "No Pendant credential stored; skipping insight sync");
            return InsightSyncReport::skipped("No Pendant API key configured");
        }
        Err(e) => return InsightSyncReport::failure(e.to_string()),
    };

    let mut state = match ctx.sync_state.get_or_create(user_id).await {
        Ok(state) => state,
        Err(e) => return InsightSyncReport::failure(e.to_string()),
    };
    state.status = SyncStatus::InProgress;
    state.error_message = None;
    state.updated_at = Utc::now();
    if let Err(e) = ctx.sync_state.save(&state).await {
        return InsightSyncReport::failure(e.to_string());
    }

    match run_insight_sync(ctx, user_id, &api_key, &mut state, &options).await {
        Ok(report) => report,
        Err(e) => {
            let message = e.to_string();
            warn!(error = %message, %user_id, "Insight sync failed");
            state.status = SyncStatus::Error;
            state.error_message = Some(message.clone());
            state.updated_at = Utc::now();
            if let Err(save_err) = ctx.sync_state.save(&state).await {
                error!(error = %save_err, %user_id, "Failed to record sync error state");
            }
            InsightSyncReport::failure(message)
        }
    }
}

async fn run_insight_sync(
    ctx: &SyncContext,
    user_id: Uuid,
    api_key: &str,
    state: &mut SyncState,
    options: &InsightSyncOptions,
) -> Result<InsightSyncReport> {
    let started = Instant::now();
    let now = Utc::now();
    let window = insight_window(state, now, options);
    info!(
        %user_id,
        window_start = %window.start,
        window_end = %window.end,
        force = options.force,
        "Starting insight sync"
    );

    let summaries = ctx.source.fetch_chat_summaries(api_key, window).await?;
    let fetched = summaries.len();

    let mut added = 0usize;
    let mut updated = 0usize;
    for summary in summaries {
        if !is_insight_label(summary.label.as_deref()) {
            continue;
        }
        let content = match summary.content.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                debug!(%user_id, summary_id = %summary.id, "Skipping insight summary with no body");
                continue;
            }
        };
        let date = insight_date(summary.created_at);

        let (document, outcome) = ctx
            .documents
            .upsert(NewDocument {
                user_id,
                date,
                content: content.to_string(),
                source_created_at: Some(summary.created_at),
            })
            .await?;

        match outcome {
            UpsertOutcome::Inserted => {
                let extraction = extract(&document.content, document.date)?;
                ctx.records
                    .replace_for_document(document.id, &extraction)
                    .await?;
                added += 1;
            }
            UpsertOutcome::Updated => {
                let extraction = extract(&document.content, document.date)?;
                ctx.records
                    .replace_for_document(document.id, &extraction)
                    .await?;
                updated += 1;
            }
            UpsertOutcome::Unchanged => {}
        }
    }

    let recovered = rederive_missing_records(ctx, user_id).await?;

    state.status = SyncStatus::Success;
    state.error_message = None;
    state.insights_fetched = fetched as i32;
    state.insights_added = added as i32;
    state.insights_updated = updated as i32;
    state.last_insights_sync_at = Some(now);
    if options.force {
        state.last_full_sync_at = Some(now);
    }
    state.updated_at = Utc::now();
    ctx.sync_state.save(state).await?;
    let sync_count = ctx.sync_state.increment_sync_count(user_id).await?;
    state.sync_count = sync_count;

    if options.scan_policy.should_scan(sync_count) {
        run_pattern_census(ctx, user_id).await;
    }

    info!(
        %user_id,
        fetched,
        added,
        updated,
        recovered,
        duration_ms = started.elapsed().as_millis() as u64,
        "Insight sync complete"
    );

    Ok(InsightSyncReport {
        success: true,
        skipped: false,
        message: format!(
            "Synced {} summaries: {} added, {} updated",
            fetched, added, updated
        ),
        fetched,
        added,
        updated,
    })
}

async fn resolve_credential(ctx: &SyncContext, user_id: Uuid) -> Result<Option<String>> {
    let settings = ctx.users.get(user_id).await?;
    Ok(settings.and_then(|s| s.pendant_api_key))
}

/// The fetch window for this invocation.
///
/// Incremental syncs resume one hour before the last success to tolerate
/// clock skew and late-arriving documents; a user with no history gets a
/// short bootstrap lookback, never a full historical scan. The end bound
/// runs a day forward to absorb timezone-boundary documents.
fn insight_window(
    state: &SyncState,
    now: DateTime<Utc>,
    options: &InsightSyncOptions,
) -> FetchWindow {
    let end = now + Duration::days(defaults::WINDOW_FORWARD_DAYS);
    let start = if options.force {
        now - Duration::days(options.lookback_days)
    } else {
        match state.last_insights_sync_at {
            Some(last) => last - Duration::hours(defaults::INSIGHT_OVERLAP_HOURS),
            None => now - Duration::days(defaults::INSIGHT_BOOTSTRAP_DAYS),
        }
    };
    FetchWindow::new(start, end)
}

/// The content date for a summary: the source generates each document at
/// dawn describing the previous day.
fn insight_date(created_at: DateTime<Utc>) -> NaiveDate {
    (created_at - Duration::days(defaults::INSIGHT_DATE_SHIFT_DAYS)).date_naive()
}

/// Whether a summary label marks a daily-insight document. Containment is
/// case-insensitive so decorated label variants still qualify.
fn is_insight_label(label: Option<&str>) -> bool {
    match label {
        Some(label) => label
            .to_lowercase()
            .contains(&defaults::INSIGHT_LABEL.to_lowercase()),
        None => false,
    }
}

/// Re-extract documents that have no derived records, recovering from a
/// sync that failed between the document write and the record write.
async fn rederive_missing_records(ctx: &SyncContext, user_id: Uuid) -> Result<usize> {
    let missing = ctx.documents.list_missing_records(user_id).await?;
    if missing.is_empty() {
        return Ok(0);
    }
    let mut recovered = 0usize;
    for document in missing {
        let extraction = extract(&document.content, document.date)?;
        ctx.records
            .replace_for_document(document.id, &extraction)
            .await?;
        recovered += 1;
    }
    info!(%user_id, recovered, "Re-derived records for documents missing them");
    Ok(recovered)
}

/// Best effort: census failures are logged, never fail a completed sync.
async fn run_pattern_census(ctx: &SyncContext, user_id: Uuid) {
    let docs = match ctx
        .documents
        .recent_contents(user_id, defaults::PATTERN_SCAN_SAMPLE)
        .await
    {
        Ok(docs) => docs,
        Err(e) => {
            warn!(error = %e, %user_id, "Pattern census skipped: could not sample documents");
            return;
        }
    };

    let candidates = scan_recurring_headers(&docs, defaults::PATTERN_SCAN_MIN_DOCS);
    if candidates.is_empty() {
        debug!(%user_id, sampled = docs.len(), "Pattern census found no unknown recurring headers");
        return;
    }
    for candidate in &candidates {
        info!(
            %user_id,
            header = %candidate.header,
            occurrences = candidate.occurrences,
            "Recurring unknown section header"
        );
    }
}
