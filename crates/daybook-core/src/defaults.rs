//! Centralized default constants for the daybook system.
//!
//! **This module is the single source of truth** for all shared default values.
//! All crates and the sync daemon should reference these constants instead of
//! defining their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// EXTRACTION
// =============================================================================

/// Minimum characters for an extracted item after cleaning.
///
/// Shorter strings are markdown shrapnel (stray bullets, emphasis markers,
/// single words) rather than content, and are dropped from every sequence
/// field. Applied after bold-stripping and whitespace collapsing.
pub const MIN_ITEM_CHARS: usize = 11;

/// Label keyword identifying daily-insight chat summaries at the source.
pub const INSIGHT_LABEL: &str = "Daily Insights";

/// Days to shift a summary's creation instant back to get its content date.
///
/// The source generates each insight document in the early morning covering
/// the previous day, so a summary created 2025-09-25T07:00Z describes
/// 2025-09-24.
pub const INSIGHT_DATE_SHIFT_DAYS: i64 = 1;

// =============================================================================
// SYNC WINDOWS
// =============================================================================

/// Full-sync lookback for insight documents, in days.
pub const INSIGHT_LOOKBACK_DAYS: i64 = 30;

/// First-ever incremental lookback for insight documents, in days.
///
/// A user with no recorded successful sync gets a short recent window, not a
/// full historical scan.
pub const INSIGHT_BOOTSTRAP_DAYS: i64 = 3;

/// Safety overlap subtracted from the last insight sync timestamp, in hours.
pub const INSIGHT_OVERLAP_HOURS: i64 = 1;

/// Full-sync lookback for lifelog entries, in days.
pub const LIFELOG_LOOKBACK_DAYS: i64 = 7;

/// First-ever incremental lookback for lifelog entries, in days.
pub const LIFELOG_BOOTSTRAP_DAYS: i64 = 2;

/// Safety overlap subtracted from the last lifelog sync timestamp, in hours.
pub const LIFELOG_OVERLAP_HOURS: i64 = 2;

/// Days past "now" every fetch window extends.
///
/// Absorbs documents timestamped ahead of the local clock by source-side
/// timezone arithmetic.
pub const WINDOW_FORWARD_DAYS: i64 = 1;

// =============================================================================
// SYNC ELIGIBILITY
// =============================================================================

/// Local hour at which the daily sync window opens.
///
/// The source finishes generating insight documents around dawn; syncing
/// before this hour would fetch yesterday's state again.
pub const SYNC_WINDOW_OPEN_HOUR: u32 = 7;

// =============================================================================
// SCHEDULER
// =============================================================================

/// Default interval between scheduled sync passes, in seconds.
pub const SYNC_INTERVAL_SECS: u64 = 600;

/// Environment variable overriding the scheduler interval.
pub const ENV_SYNC_INTERVAL_SECS: &str = "SYNC_INTERVAL_SECS";

/// Environment variable overriding the full-sync insight lookback.
pub const ENV_SYNC_LOOKBACK_DAYS: &str = "SYNC_LOOKBACK_DAYS";

// =============================================================================
// PATTERN CENSUS
// =============================================================================

/// Run the recurring-header census every Nth successful insight sync.
pub const PATTERN_SCAN_EVERY: u32 = 5;

/// Environment variable overriding the census cadence (0 disables).
pub const ENV_PATTERN_SCAN_EVERY: &str = "PATTERN_SCAN_EVERY";

/// Minimum distinct documents a header must appear in to be reported.
pub const PATTERN_SCAN_MIN_DOCS: usize = 3;

/// Documents sampled per census pass.
pub const PATTERN_SCAN_SAMPLE: i64 = 50;

// =============================================================================
// PENDANT SOURCE
// =============================================================================

/// Default Pendant API base URL.
pub const PENDANT_API_BASE: &str = "https://api.pendant.dev";

/// Environment variable for the Pendant API base URL.
pub const ENV_PENDANT_API_BASE: &str = "PENDANT_API_BASE";

/// Timeout for Pendant API requests in seconds.
pub const PENDANT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the Pendant request timeout.
pub const ENV_PENDANT_TIMEOUT_SECS: &str = "PENDANT_TIMEOUT_SECS";

/// Page size requested from paginated Pendant endpoints.
pub const PENDANT_PAGE_LIMIT: i64 = 50;

/// Hard cap on pages fetched per window (runaway-cursor guard).
pub const PENDANT_MAX_PAGES: usize = 20;

// =============================================================================
// TIMEZONE
// =============================================================================

/// Reference timezone for deriving lifelog entry dates from UTC instants.
///
/// Deliberately fixed rather than per-user: entry dates must stay stable
/// across resyncs even when a user changes their timezone preference. The
/// per-user preference governs the sync-eligibility window instead.
pub const REFERENCE_TIMEZONE: &str = "America/New_York";

/// Environment variable overriding the reference timezone.
pub const ENV_REFERENCE_TIMEZONE: &str = "DAYBOOK_REFERENCE_TZ";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for document listings.
pub const PAGE_LIMIT: i64 = 50;

/// Internal "fetch everything" limit for reprocessing sweeps.
pub const INTERNAL_FETCH_LIMIT: i64 = 10_000;

// =============================================================================
// SCAN POLICY
// =============================================================================

/// When the recurring-header census runs relative to insight syncs.
///
/// - `EveryNth(n)`: run on every nth successful sync per user, counted by the
///   persisted sync counter. Deterministic and replayable.
/// - `Never`: census disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPolicy {
    EveryNth(u32),
    Never,
}

impl ScanPolicy {
    /// Load the policy from `PATTERN_SCAN_EVERY` with fallback to the default
    /// cadence. `0` disables the census.
    pub fn from_env() -> Self {
        match std::env::var(ENV_PATTERN_SCAN_EVERY) {
            Ok(val) => match val.parse::<u32>() {
                Ok(0) => Self::Never,
                Ok(n) => Self::EveryNth(n),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid PATTERN_SCAN_EVERY, using default");
                    Self::EveryNth(PATTERN_SCAN_EVERY)
                }
            },
            Err(_) => Self::EveryNth(PATTERN_SCAN_EVERY),
        }
    }

    /// Whether the census should run after the sync that brought the user's
    /// counter to `sync_count`.
    pub fn should_scan(&self, sync_count: i64) -> bool {
        match self {
            Self::EveryNth(n) => *n > 0 && sync_count > 0 && sync_count % (*n as i64) == 0,
            Self::Never => false,
        }
    }
}

impl std::fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EveryNth(n) => write!(f, "every_{}", n),
            Self::Never => write!(f, "never"),
        }
    }
}
