//! Recurring sync scheduler.
//!
//! Drives the orchestrators on a timer: each sweep lists users holding a
//! Pendant credential and runs document sync then lifelog sync serially,
//! one user at a time. Serial execution is what keeps the per-user
//! bookkeeping race-free; the orchestrators do not lock. The orchestrators
//! stay callable standalone, the scheduler is just one caller.

use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use daybook_core::{defaults, user_timezone, Error, Result, UserSettings};

use crate::insights::{sync_insights, InsightSyncOptions};
use crate::lifelogs::{sync_lifelogs, LifelogSyncOptions};
use crate::status::sync_eligibility;
use crate::SyncContext;

/// Configuration for the sync scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seconds between sweeps.
    pub interval: Duration,
    /// Whether the recurring loop runs at all.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(defaults::SYNC_INTERVAL_SECS),
            enabled: true,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_ENABLED` | `true` | Enable/disable the recurring sync loop |
    /// | `SYNC_INTERVAL_SECS` | `600` | Seconds between sweeps |
    pub fn from_env() -> Self {
        let enabled = std::env::var("SYNC_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let interval_secs = std::env::var(defaults::ENV_SYNC_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SYNC_INTERVAL_SECS)
            .max(1);

        Self {
            interval: Duration::from_secs(interval_secs),
            enabled,
        }
    }

    /// Set the sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enable or disable the recurring loop.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Handle for controlling a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Signal the scheduler to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))
    }
}

/// Recurring sync driver.
pub struct SyncScheduler {
    ctx: SyncContext,
    config: SchedulerConfig,
}

impl SyncScheduler {
    /// Create a new scheduler over the given context.
    pub fn new(ctx: SyncContext, config: SchedulerConfig) -> Self {
        Self { ctx, config }
    }

    /// Start the scheduler and return a handle for control.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        SchedulerHandle { shutdown_tx }
    }

    /// Run the sweep loop. The first sweep happens immediately; each
    /// subsequent sweep waits out the interval.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Sync scheduler is disabled, not starting");
            return;
        }

        info!(
            interval_secs = self.config.interval.as_secs(),
            "Sync scheduler started"
        );

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Sync scheduler received shutdown signal");
                break;
            }

            self.sweep().await;

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Sync scheduler received shutdown signal");
                    break;
                }
                _ = sleep(self.config.interval) => {}
            }
        }

        info!("Sync scheduler stopped");
    }

    /// One pass over every user holding a credential.
    async fn sweep(&self) {
        let started = Instant::now();
        let users = match self.ctx.users.list_with_credentials().await {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, "Failed to list users for sync sweep");
                return;
            }
        };
        if users.is_empty() {
            debug!("No users with Pendant credentials; nothing to sync");
            return;
        }

        debug!(users = users.len(), "Starting sync sweep");
        let mut synced = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;
        for settings in users {
            match self.sync_user(&settings).await {
                Ok(true) => synced += 1,
                Ok(false) => skipped += 1,
                Err(e) => {
                    failed += 1;
                    error!(error = %e, user_id = %settings.user_id, "Sync failed for user");
                }
            }
        }

        info!(
            synced,
            skipped,
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Sync sweep complete"
        );
    }

    /// Sync one user if eligible. Returns whether a sync ran.
    async fn sync_user(&self, settings: &UserSettings) -> Result<bool> {
        let user_id = settings.user_id;
        let state = self.ctx.sync_state.get_or_create(user_id).await?;
        let tz = user_timezone(settings.timezone.as_deref());
        let eligibility = sync_eligibility(&state, tz, Utc::now());
        if !eligibility.should_sync {
            debug!(%user_id, reason = %eligibility.reason, "User not eligible for sync");
            return Ok(false);
        }
        info!(%user_id, reason = %eligibility.reason, "Syncing user");

        let insight_report =
            sync_insights(&self.ctx, user_id, InsightSyncOptions::from_env()).await;
        if !insight_report.success {
            warn!(%user_id, message = %insight_report.message, "Insight sync reported failure");
        }

        let lifelog_report = sync_lifelogs(&self.ctx, user_id, LifelogSyncOptions::default()).await;
        if !lifelog_report.success {
            warn!(%user_id, message = %lifelog_report.message, "Lifelog sync reported failure");
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(600));
        assert!(config.enabled);
    }

    #[test]
    fn test_scheduler_config_builder() {
        let config = SchedulerConfig::default()
            .with_interval(Duration::from_secs(30))
            .with_enabled(false);
        assert_eq!(config.interval, Duration::from_secs(30));
        assert!(!config.enabled);
    }
}
