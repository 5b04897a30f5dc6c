use crate::types::{PRECISION, SECONDS_PER_YEAR};

/// Seconds left until `end_unix_ts`, clamped at zero.
#[inline]
pub fn time_to_expiry(end_unix_ts: i64, current_unix_ts: i64) -> i64 {
    (end_unix_ts - current_unix_ts).max(0)
}

/// Remaining time as a fixed-point fraction of a 365-day year.
///
/// years = max(end - now, 0) · PRECISION / SECONDS_PER_YEAR   (floor)
///
/// Zero at and after maturity.
pub fn years_to_expiry_nano(end_unix_ts: i64, current_unix_ts: i64) -> i128 {
    time_to_expiry(end_unix_ts, current_unix_ts) as i128 * PRECISION / SECONDS_PER_YEAR as i128
}

/// Signed years since `start_unix_ts`. Negative before the market opens.
pub fn years_elapsed(start_unix_ts: i64, current_unix_ts: i64) -> f64 {
    (current_unix_ts - start_unix_ts) as f64 / SECONDS_PER_YEAR as f64
}
