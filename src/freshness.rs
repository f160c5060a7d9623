//! Freshness Clock: compare a stored `last_seen` timestamp against a
//! configured TTL window.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Attach UTC to a naive timestamp, or convert an already-aware one.
/// `chrono::DateTime<Utc>` is always tz-aware in this codebase, so this
/// exists mainly for the naive-timestamp case surfaced by some store rows.
pub fn force_utc_naive(dt: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&dt)
}

/// True iff `ts` is present and strictly newer than `now - days`.
pub fn seen_recently(ts: Option<DateTime<Utc>>, days: i64, now: DateTime<Utc>) -> bool {
    match ts {
        Some(ts) => ts > now - chrono::Duration::days(days),
        None => false,
    }
}
