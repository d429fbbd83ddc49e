//! Calendar helpers for day-indexed replay.
//!
//! The program is replayed one UTC calendar day at a time. Day 0 starts at
//! the program start timestamp; all indices and ratios derive from that
//! boundary.

use chrono::{DateTime, NaiveDate, Utc};

use crate::constants::{RATIO_PRECISION, SECS_PER_DAY};

/// UTC calendar date containing a unix timestamp.
///
/// Timestamps outside chrono's representable range collapse to
/// [`NaiveDate::MIN`]; `Settings::validate` rejects such configurations
/// before any caller gets here.
pub fn date_of(ts: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Midnight (start of day) of `date`, as a unix timestamp.
pub fn day_start(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(i64::MIN)
}

/// Exclusive end of `date` (midnight of the next day), as a unix timestamp.
pub fn day_end(date: NaiveDate) -> i64 {
    day_start(date) + SECS_PER_DAY
}

/// Whole days elapsed from `start` to `date`, clamped at zero.
pub fn day_index(start: NaiveDate, date: NaiveDate) -> u64 {
    date.signed_duration_since(start).num_days().max(0) as u64
}

/// Fraction of `date` elapsed at `now`, in ppb, measured from `since`
/// when `since` falls inside the day and from midnight otherwise.
///
/// Used for partial "today" accounting: the pending ledger only earns for
/// the slice of today not yet covered by the last distribution.
pub fn partial_day_ratio(date: NaiveDate, now: i64, since: Option<i64>) -> u64 {
    let floor = day_start(date);
    let from = since.unwrap_or(floor).max(floor);
    let elapsed = (now - from).clamp(0, SECS_PER_DAY);
    (elapsed as u128 * RATIO_PRECISION as u128 / SECS_PER_DAY as u128) as u64
}
