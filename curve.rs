//! Logit pricing curve.
//!
//! The marginal exchange rate (IB paid per PT, fixed-point) at PT proportion `p` is
//!
//!   rate(p) = ln(p / (1 - p)) / rateScalar + rateAnchor
//!
//! where `rateScalar = scalarRoot / yearsToExpiry` steepens as maturity approaches,
//! and `rateAnchor` is recalibrated before every trade so that the curve evaluated at
//! the current proportion reproduces the pool's last implied rate.
//!
//! `ln` and `pow` are evaluated in f64; everything else is integer fixed-point with
//! the truncation rules of the on-chain program (floor for proportions, toward zero
//! for the signed curve term).

use crate::error::{QuoteError, QuoteResult};
use crate::expiry::years_to_expiry_nano;
use crate::types::{from_f64, to_f64, PRECISION};

/// PT share of total reserves: floor(n_pt · PRECISION / (n_pt + n_asset)).
///
/// An empty pool is priced at exactly one half.
pub fn proportion_nano(n_pt: i128, n_asset: i128) -> i128 {
    let denominator = n_pt + n_asset;
    if denominator == 0 {
        PRECISION / 2
    } else {
        (n_pt * PRECISION).div_euclid(denominator)
    }
}

/// ln(p / (PRECISION - p)) scaled to fixed-point. Rejects `p` on or outside (0, PRECISION).
pub fn ln_odds_nano(p: i128) -> QuoteResult<i128> {
    if p <= 0 || p >= PRECISION {
        return Err(QuoteError::InvalidProportion(p));
    }
    let odds = p as f64 / (PRECISION - p) as f64;
    from_f64(odds.ln())
}

/// rateScalar = scalarRoot · PRECISION / yearsToExpiry.
///
/// `None` at maturity: the scalar diverges and the curve term vanishes.
pub fn rate_scalar_nano(scalar_root_nano: i128, years_to_expiry_nano: i128) -> Option<i128> {
    if years_to_expiry_nano <= 0 {
        return None;
    }
    Some(scalar_root_nano * PRECISION / years_to_expiry_nano)
}

/// PRECISION · lnTerm / rateScalar, truncated toward zero.
fn curve_term_nano(ln_odds_nano: i128, rate_scalar_nano: Option<i128>) -> QuoteResult<i128> {
    match rate_scalar_nano {
        None => Ok(0),
        Some(scalar) if scalar > 0 => ln_odds_nano
            .checked_mul(PRECISION)
            .map(|n| n / scalar)
            .ok_or(QuoteError::Overflow),
        Some(_) => Err(QuoteError::InvalidPool("rate scalar must be positive")),
    }
}

/// Marginal exchange rate at proportion `p`. Must come out strictly positive.
pub fn exchange_rate_nano(
    p: i128,
    rate_scalar_nano: Option<i128>,
    rate_anchor_nano: i128,
) -> QuoteResult<i128> {
    let ln_odds = ln_odds_nano(p)?;
    let rate = curve_term_nano(ln_odds, rate_scalar_nano)?
        .checked_add(rate_anchor_nano)
        .ok_or(QuoteError::Overflow)?;
    if rate <= 0 {
        return Err(QuoteError::NegativeExchangeRate(rate));
    }
    Ok(rate)
}

/// lastImpliedRate ^ yearsToExpiry, i.e. the exchange rate the last implied rate
/// corresponds to with the current time left. Equals PRECISION at maturity.
pub fn exchange_rate_target_nano(last_implied_rate_nano: i128, years_to_expiry_nano: i128) -> QuoteResult<i128> {
    from_f64(to_f64(last_implied_rate_nano).powf(to_f64(years_to_expiry_nano)))
}

/// Inverse of [`exchange_rate_target_nano`]: the annualized rate embedded in an exchange rate.
///
/// `Ok(None)` at maturity, where no rate is implied.
pub fn implied_rate_nano(exchange_rate_nano: i128, years_to_expiry_nano: i128) -> QuoteResult<Option<i128>> {
    if years_to_expiry_nano <= 0 || exchange_rate_nano <= 0 {
        return Ok(None);
    }
    let exponent = 1.0 / to_f64(years_to_expiry_nano);
    from_f64(to_f64(exchange_rate_nano).powf(exponent)).map(Some)
}

/// Recentre the curve on the current reserves.
///
/// anchor = lastImpliedRate^yearsToExpiry - PRECISION · ln(p/(1-p)) / rateScalar
///
/// so that `exchange_rate_nano(p, rateScalar, anchor)` at the pre-trade proportion
/// returns the rate implied by the last trade. A non-positive anchor means the pool
/// state is inconsistent or extreme and is reported as [`QuoteError::DegenerateAnchor`].
pub fn update_rate_anchor(
    n_pt: i128,
    n_asset: i128,
    scalar_root_nano: i128,
    last_implied_rate_nano: i128,
    end_unix_ts: i64,
    current_unix_ts: i64,
) -> QuoteResult<i128> {
    let p = proportion_nano(n_pt, n_asset);
    let ln_odds = ln_odds_nano(p)?;

    let years = years_to_expiry_nano(end_unix_ts, current_unix_ts);
    let rate_scalar = rate_scalar_nano(scalar_root_nano, years);
    let target = exchange_rate_target_nano(last_implied_rate_nano, years)?;

    let anchor = target
        .checked_sub(curve_term_nano(ln_odds, rate_scalar)?)
        .ok_or(QuoteError::Overflow)?;
    if anchor <= 0 {
        return Err(QuoteError::DegenerateAnchor(anchor));
    }
    Ok(anchor)
}
