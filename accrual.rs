//! Base-value accrual of IB and the PT+YT mint/redeem quotes that follow from it.
//!
//! IB is assumed to grow at a fixed ACCRUAL_BASE per year, continuously compounded:
//!
//!   basePerIb(t) = ACCRUAL_BASE ^ (years since market start)
//!
//! This is an external accrual curve, independent of the pool's implied rate.

use crate::error::{QuoteError, QuoteResult};
use crate::expiry::years_elapsed;
use crate::types::{from_f64, ACCRUAL_BASE, PRECISION};

/// Base units backing one IB at `current_unix_ts`, fixed-point.
pub fn base_per_ib_nano(current_unix_ts: i64, start_unix_ts: i64) -> QuoteResult<i128> {
    from_f64(ACCRUAL_BASE.powf(years_elapsed(start_unix_ts, current_unix_ts)))
}

/// PT (and as many YT) minted from `ib_in` IB.
pub fn mint_pt_yt(ib_in: i128, base_per_ib_nano: i128) -> QuoteResult<i128> {
    check_amounts(ib_in, base_per_ib_nano)?;
    ib_in
        .checked_mul(base_per_ib_nano)
        .map(|n| n / PRECISION)
        .ok_or(QuoteError::Overflow)
}

/// IB returned for redeeming `pt_yt_in` PT together with as many YT.
pub fn redeem_ib(pt_yt_in: i128, base_per_ib_nano: i128) -> QuoteResult<i128> {
    check_amounts(pt_yt_in, base_per_ib_nano)?;
    pt_yt_in
        .checked_mul(PRECISION)
        .map(|n| n / base_per_ib_nano)
        .ok_or(QuoteError::Overflow)
}

fn check_amounts(amount: i128, base_per_ib_nano: i128) -> QuoteResult<()> {
    if amount < 0 {
        return Err(QuoteError::InvalidAmount(amount));
    }
    if base_per_ib_nano <= 0 {
        return Err(QuoteError::InvalidAmount(base_per_ib_nano));
    }
    Ok(())
}
