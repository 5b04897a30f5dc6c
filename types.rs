use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, QuoteResult};

/// Fixed-point scale: 1.0 = 1_000_000_000 (1e9)
pub const PRECISION: i128 = 1_000_000_000;
pub const PRECISION_F: f64 = 1_000_000_000.0;

/// 365-day year. Not calendar-accurate; on-chain values are computed with the same constant.
pub const SECONDS_PER_YEAR: i64 = 31_536_000;

/// Hard cap on bisection steps for both root searches.
pub const MAX_ITERATIONS: usize = 100;

/// Residual tolerance of the root searches, in fixed-point units.
pub const TOLERANCE: i128 = 1;

/// Yearly growth of IB's underlying base value used by the accrual quotes.
pub const ACCRUAL_BASE: f64 = 1.2;

// ─── Pool state ───────────────────────────────────────────────────────────────

/// Reserves and curve parameters of an AMM at one point in time.
///
/// Read from on-chain account state by the caller. All quantities are in base
/// units; `scalar_root_nano` and `last_implied_rate_nano` are scaled by [`PRECISION`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// PT reserve
    pub n_pt: i128,
    /// IB reserve denominated in the AMM's asset units
    pub n_asset: i128,
    /// Curve steepness at one year to expiry
    pub scalar_root_nano: i128,
    /// Exchange rate (IB per PT over one year) recorded by the last trade
    pub last_implied_rate_nano: i128,

    // Liquidity accounting, only read by the LP quotes
    #[serde(default)]
    pub n_ib: i128,
    #[serde(default)]
    pub lp_supply: i128,
}

impl PoolSnapshot {
    pub fn new(n_pt: i128, n_asset: i128, scalar_root_nano: i128, last_implied_rate_nano: i128) -> Self {
        Self {
            n_pt,
            n_asset,
            scalar_root_nano,
            last_implied_rate_nano,
            n_ib: 0,
            lp_supply: 0,
        }
    }
}

/// Trading lifetime of a market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketWindow {
    pub start_unix_ts: i64,
    pub end_unix_ts: i64,
}

impl MarketWindow {
    pub fn new(start_unix_ts: i64, end_unix_ts: i64) -> Self {
        Self { start_unix_ts, end_unix_ts }
    }

    #[inline]
    pub fn is_matured(&self, now: i64) -> bool {
        now >= self.end_unix_ts
    }
}

// ─── Requests and quotes ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    /// Sell PT into the pool, receive IB. Amount is `deltaPt`.
    PtToIb,
    /// Pay IB into the pool, receive PT. Amount is `dIb`.
    IbToPt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub direction: TradeDirection,
    pub amount: i128,
}

impl TradeRequest {
    pub fn pt_to_ib(delta_pt: i128) -> Self {
        Self { direction: TradeDirection::PtToIb, amount: delta_pt }
    }

    pub fn ib_to_pt(d_ib: i128) -> Self {
        Self { direction: TradeDirection::IbToPt, amount: d_ib }
    }
}

/// Result of one swap quote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub direction: TradeDirection,
    pub amount_in: i128,
    pub amount_out: i128,
    /// Marginal exchange rate at the post-trade proportion
    pub exchange_rate_nano: i128,
    /// Anchor calibrated from the pre-trade state
    pub rate_anchor_nano: i128,
    /// Annualized rate implied by `exchange_rate_nano`; `None` once the market has matured
    pub implied_rate_nano: Option<i128>,
}

/// Split of a merchant payment into the part locked by the customer and the part sold to the AMM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockQuote {
    pub required_lock_amount: i128,
    pub merchant_portion: i128,
    pub amm_sold_portion: i128,
}

// ─── Fixed-point helpers ──────────────────────────────────────────────────────

#[inline]
pub fn to_f64(nano: i128) -> f64 {
    nano as f64 / PRECISION_F
}

/// Back to fixed-point, truncating toward zero.
///
/// `as` saturates silently, so anything non-finite or outside the i128 range is
/// reported as [`QuoteError::Overflow`] instead.
#[inline]
pub fn from_f64(value: f64) -> QuoteResult<i128> {
    let scaled = value * PRECISION_F;
    if !scaled.is_finite() || scaled.abs() >= i128::MAX as f64 {
        return Err(QuoteError::Overflow);
    }
    Ok(scaled as i128)
}
