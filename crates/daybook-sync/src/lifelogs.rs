//! Lifelog sync.
//!
//! Pulls timestamped transcript entries from the Pendant API and upserts
//! them keyed by remote identifier. Each entry's calendar date comes from
//! its UTC start instant in the fixed reference timezone so stored dates
//! stay stable across resyncs; see [`daybook_core::temporal`].

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use daybook_core::{
    defaults, local_date, reference_timezone, FetchWindow, LifelogCategory, LifelogSyncReport,
    NewLifelog, RemoteLifelog, Result, SyncState, SyncStatus, UpsertOutcome,
};

use crate::SyncContext;

/// Options for one lifelog sync invocation.
#[derive(Debug, Clone)]
pub struct LifelogSyncOptions {
    /// Refetch the full lookback window and rewrite entries even when no
    /// compared field differs.
    pub force: bool,
    /// Window size for forced syncs, in days.
    pub lookback_days: i64,
}

impl Default for LifelogSyncOptions {
    fn default() -> Self {
        Self {
            force: false,
            lookback_days: defaults::LIFELOG_LOOKBACK_DAYS,
        }
    }
}

impl LifelogSyncOptions {
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
}

/// Sync lifelog entries for one user.
///
/// Callable standalone, same shape as insight sync: missing credential skips,
/// failures are written to bookkeeping and folded into the report.
#[instrument(skip(ctx, options))]
pub async fn sync_lifelogs(
    ctx: &SyncContext,
    user_id: Uuid,
    options: LifelogSyncOptions,
) -> LifelogSyncReport {
    let api_key = match ctx.users.get(user_id).await {
        Ok(settings) => match settings.and_then(|s| s.pendant_api_key) {
            Some(key) => key,
            None => {
                debug!(%user_id, "No Pendant credential stored; skipping lifelog sync");
                return credential_skip_report();
            }
        },
        Err(e) => return LifelogSyncReport::failure(e.to_string()),
    };

    let mut state = match ctx.sync_state.get_or_create(user_id).await {
        Ok(state) => state,
        Err(e) => return LifelogSyncReport::failure(e.to_string()),
    };
    state.status = SyncStatus::InProgress;
    state.error_message = None;
    state.updated_at = Utc::now();
    if let Err(e) = ctx.sync_state.save(&state).await {
        return LifelogSyncReport::failure(e.to_string());
    }

    match run_lifelog_sync(ctx, user_id, &api_key, &mut state, &options).await {
        Ok(report) => report,
        Err(e) => {
            let message = e.to_string();
            warn!(error = %message, %user_id, "Lifelog sync failed");
            state.status = SyncStatus::Error;
            state.error_message = Some(message.clone());
            state.updated_at = Utc::now();
            if let Err(save_err) = ctx.sync_state.save(&state).await {
                error!(error = %save_err, %user_id, "Failed to record sync error state");
            }
            LifelogSyncReport::failure(message)
        }
    }
}

async fn run_lifelog_sync(
    ctx: &SyncContext,
    user_id: Uuid,
    api_key: &str,
    state: &mut SyncState,
    options: &LifelogSyncOptions,
) -> Result<LifelogSyncReport> {
    let started = Instant::now();
    let now = Utc::now();
    let window = lifelog_window(state, now, options);
    info!(
        %user_id,
        window_start = %window.start,
        window_end = %window.end,
        force = options.force,
        "Starting lifelog sync"
    );

    let entries = ctx.source.fetch_lifelogs(api_key, window).await?;
    let total_processed = entries.len();
    let reference_tz = reference_timezone();

    let mut synced = 0usize;
    let mut updated = 0usize;
    let mut skipped = 0usize;
    for remote in entries {
        let entry = match normalize_lifelog(user_id, remote, reference_tz) {
            Some(entry) => entry,
            None => {
                debug!(%user_id, "Dropping lifelog entry with no remote identifier");
                continue;
            }
        };
        match ctx.lifelogs.upsert(entry, options.force).await? {
            UpsertOutcome::Inserted => synced += 1,
            UpsertOutcome::Updated => updated += 1,
            UpsertOutcome::Unchanged => skipped += 1,
        }
    }

    state.status = SyncStatus::Success;
    state.error_message = None;
    state.lifelogs_fetched = total_processed as i32;
    state.lifelogs_added = synced as i32;
    state.lifelogs_updated = updated as i32;
    state.last_lifelogs_sync_at = Some(now);
    if options.force {
        state.last_full_sync_at = Some(now);
    }
    state.updated_at = Utc::now();
    ctx.sync_state.save(state).await?;

    info!(
        %user_id,
        fetched = total_processed,
        added = synced,
        updated,
        skipped,
        duration_ms = started.elapsed().as_millis() as u64,
        "Lifelog sync complete"
    );

    Ok(LifelogSyncReport {
        success: true,
        message: format!(
            "Processed {} lifelogs: {} new, {} updated, {} unchanged",
            total_processed, synced, updated, skipped
        ),
        synced,
        updated,
        skipped,
        total_processed,
    })
}

/// A non-error result for users holding no source credential.
fn credential_skip_report() -> LifelogSyncReport {
    LifelogSyncReport {
        success: true,
        message: "No Pendant API key configured".to_string(),
        synced: 0,
        updated: 0,
        skipped: 0,
        total_processed: 0,
    }
}

/// The fetch window for this invocation. Same shape as the insight window
/// but with a wider overlap, since lifelogs arrive as recordings finish
/// rather than on a dawn schedule.
fn lifelog_window(
    state: &SyncState,
    now: DateTime<Utc>,
    options: &LifelogSyncOptions,
) -> FetchWindow {
    let end = now + Duration::days(defaults::WINDOW_FORWARD_DAYS);
    let start = if options.force {
        now - Duration::days(options.lookback_days)
    } else {
        match state.last_lifelogs_sync_at {
            Some(last) => last - Duration::hours(defaults::LIFELOG_OVERLAP_HOURS),
            None => now - Duration::days(defaults::LIFELOG_BOOTSTRAP_DAYS),
        }
    };
    FetchWindow::new(start, end)
}

/// Normalize a remote entry into an insertable row.
///
/// Returns `None` for entries with no remote identifier; without one there
/// is no key to dedupe on, so the entry cannot be tracked. The category is
/// source-provided when it parses, otherwise inferred from title and summary.
fn normalize_lifelog(user_id: Uuid, remote: RemoteLifelog, reference_tz: Tz) -> Option<NewLifelog> {
    let remote_id = remote
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())?
        .to_string();

    let category = match remote.category.as_deref().and_then(LifelogCategory::parse) {
        Some(category) => category,
        None => {
            let text = format!(
                "{} {}",
                remote.title.as_deref().unwrap_or(""),
                remote.summary.as_deref().unwrap_or("")
            );
            LifelogCategory::infer(&text)
        }
    };

    Some(NewLifelog {
        remote_id,
        user_id,
        date: local_date(remote.started_at, reference_tz),
        title: remote.title,
        summary: remote.summary,
        markdown_content: remote.markdown,
        category,
        started_at: remote.started_at,
        ended_at: remote.ended_at,
    })
}
