mod issuer_tests;
mod reaper_tests;

use chrono::{DateTime, TimeZone, Utc};

/// Whole-second instant used as "now" across the token tests
pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}
