//! Timezone-aware date helpers.
//!
//! Two distinct timezones flow through daybook and must not be conflated:
//!
//! - The **reference timezone** (`DAYBOOK_REFERENCE_TZ`, default
//!   America/New_York) derives lifelog entry dates from UTC instants. It is
//!   fixed so that stored dates stay stable across resyncs.
//! - The **user timezone preference** governs the daily sync-eligibility
//!   window and falls back to the reference timezone when unset or invalid.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::defaults;
use crate::error::{Error, Result};

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::Config(format!("unknown timezone: {}", name)))
}

/// The reference timezone for lifelog date derivation.
///
/// Reads `DAYBOOK_REFERENCE_TZ` on each call; an unset or invalid value
/// falls back to the compiled default.
pub fn reference_timezone() -> Tz {
    match std::env::var(defaults::ENV_REFERENCE_TIMEZONE) {
        Ok(name) => match name.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(value = %name, "Invalid DAYBOOK_REFERENCE_TZ, using default");
                default_reference_timezone()
            }
        },
        Err(_) => default_reference_timezone(),
    }
}

fn default_reference_timezone() -> Tz {
    // The default is a fixed IANA name known to the compiled-in tz database.
    defaults::REFERENCE_TIMEZONE
        .parse::<Tz>()
        .unwrap_or(chrono_tz::America::New_York)
}

/// Resolve a user's timezone preference, falling back to the reference
/// timezone when unset or unparseable.
pub fn user_timezone(preference: Option<&str>) -> Tz {
    match preference {
        Some(name) => match name.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(value = %name, "Invalid user timezone, using reference");
                reference_timezone()
            }
        },
        None => reference_timezone(),
    }
}

/// The local calendar date of a UTC instant in the given timezone.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}
