//! Sync eligibility decisions.
//!
//! The Pendant service generates each day's insight document at dawn, so a
//! sync attempted earlier cannot find today's document. The daily window
//! opens at 07:00 in the user's timezone preference (reference timezone when
//! unset). Lifelog date derivation deliberately does not use this preference;
//! see [`daybook_core::temporal`].

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use daybook_core::defaults::SYNC_WINDOW_OPEN_HOUR;
use daybook_core::{SyncEligibility, SyncState, SyncStatus};

/// Decide whether a sync should run for a user right now.
///
/// The checks are ordered: an in-progress sync wins over everything, the
/// daily window gate comes next, and only then does history matter. The
/// insight-sync timestamp drives the history checks because the window
/// tracks the source's document generation schedule.
pub fn sync_eligibility(state: &SyncState, user_tz: Tz, now: DateTime<Utc>) -> SyncEligibility {
    if state.status == SyncStatus::InProgress {
        return SyncEligibility {
            should_sync: false,
            reason: "Sync already in progress".to_string(),
        };
    }

    let local_now = now.with_timezone(&user_tz);
    if local_now.hour() < SYNC_WINDOW_OPEN_HOUR {
        return SyncEligibility {
            should_sync: false,
            reason: format!(
                "Daily insights are generated after {:02}:00; current local time is {}",
                SYNC_WINDOW_OPEN_HOUR,
                local_now.format("%H:%M")
            ),
        };
    }

    let last_success = match state.last_insights_sync_at {
        Some(last) => last,
        None => {
            return SyncEligibility {
                should_sync: true,
                reason: "Never synced".to_string(),
            };
        }
    };

    if state.status == SyncStatus::Error {
        return SyncEligibility {
            should_sync: true,
            reason: "Previous sync failed".to_string(),
        };
    }

    let last_local = last_success.with_timezone(&user_tz);
    let synced_in_todays_window = last_local.date_naive() == local_now.date_naive()
        && last_local.hour() >= SYNC_WINDOW_OPEN_HOUR;
    if !synced_in_todays_window {
        return SyncEligibility {
            should_sync: true,
            reason: "Last sync predates today's insight generation".to_string(),
        };
    }

    SyncEligibility {
        should_sync: false,
        reason: format!("Already synced today at {}", last_local.format("%H:%M")),
    }
}
