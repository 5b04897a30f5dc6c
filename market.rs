use log::{debug, trace};

use crate::curve::{exchange_rate_nano, implied_rate_nano, proportion_nano, rate_scalar_nano, update_rate_anchor};
use crate::error::{QuoteError, QuoteResult};
use crate::expiry::years_to_expiry_nano;
use crate::types::{MarketWindow, PoolSnapshot, MAX_ITERATIONS, PRECISION, TOLERANCE};

// ─── Pre-trade calibration ────────────────────────────────────────────────────

/// Curve parameters derived from the pre-trade pool state.
///
/// Everything a solver needs to price a candidate trade: the anchor is calibrated
/// once against the reserves *before* the trade and reused for every post-trade
/// proportion evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurveState {
    pub n_pt: i128,
    pub n_asset: i128,
    pub years_to_expiry_nano: i128,
    /// `None` at or after maturity
    pub rate_scalar_nano: Option<i128>,
    pub rate_anchor_nano: i128,
}

impl CurveState {
    pub fn calibrate(pool: &PoolSnapshot, window: &MarketWindow, now: i64) -> QuoteResult<Self> {
        validate_pool(pool)?;

        let years = years_to_expiry_nano(window.end_unix_ts, now);
        let rate_anchor_nano = update_rate_anchor(
            pool.n_pt,
            pool.n_asset,
            pool.scalar_root_nano,
            pool.last_implied_rate_nano,
            window.end_unix_ts,
            now,
        )?;

        Ok(Self {
            n_pt: pool.n_pt,
            n_asset: pool.n_asset,
            years_to_expiry_nano: years,
            rate_scalar_nano: rate_scalar_nano(pool.scalar_root_nano, years),
            rate_anchor_nano,
        })
    }

    /// Marginal exchange rate once `delta_pt` PT has entered the pool.
    #[inline]
    pub fn rate_after(&self, delta_pt: i128) -> QuoteResult<i128> {
        let p = proportion_nano(self.n_pt + delta_pt, self.n_asset - delta_pt);
        exchange_rate_nano(p, self.rate_scalar_nano, self.rate_anchor_nano)
    }

    /// Pre-trade marginal rate.
    pub fn spot_rate(&self) -> QuoteResult<i128> {
        self.rate_after(0)
    }

    pub fn implied_rate(&self, exchange_rate_nano: i128) -> QuoteResult<Option<i128>> {
        implied_rate_nano(exchange_rate_nano, self.years_to_expiry_nano)
    }

    /// Closed-form PT→IB. Returns (dIb, post-trade exchange rate).
    ///
    /// dIb = floor(deltaPt · PRECISION / rate(post-trade proportion))
    ///
    /// A negative `delta_pt` takes PT out of the pool and yields a negative dIb.
    pub fn sell_pt(&self, delta_pt: i128) -> QuoteResult<(i128, i128)> {
        let rate = self.rate_after(delta_pt)?;
        let d_ib = delta_pt
            .checked_mul(PRECISION)
            .ok_or(QuoteError::Overflow)?
            .div_euclid(rate);
        Ok((d_ib, rate))
    }

    /// IB→PT by bisection over dPt ∈ [0, n_asset]. Returns (dPt, post-trade exchange rate).
    ///
    /// The residual `rate(dPt) - floor(dPt · PRECISION / dIb)` falls as dPt grows:
    /// the curve rate climbs slowly with the proportion while the rate the trade
    /// itself implies climbs linearly.
    pub fn buy_pt(&self, d_ib: i128) -> QuoteResult<(i128, i128)> {
        if d_ib < 0 {
            return Err(QuoteError::InvalidAmount(d_ib));
        }
        if d_ib == 0 {
            return Ok((0, self.spot_rate()?));
        }

        let root = bisect(0, self.n_asset, Slope::Falling, |d_pt| {
            // Draining the asset side puts the proportion on its boundary.
            if self.n_asset - d_pt <= 0 {
                return Ok(None);
            }
            let rate = self.rate_after(d_pt)?;
            let rate_from_trade = d_pt
                .checked_mul(PRECISION)
                .ok_or(QuoteError::Overflow)?
                .div_euclid(d_ib);
            Ok(Some(rate - rate_from_trade))
        })?;

        debug!(
            "ib_to_pt: d_ib={} -> d_pt={} (residual {}, {} iterations)",
            d_ib, root.value, root.residual, root.iterations
        );
        Ok((root.value, self.rate_after(root.value)?))
    }
}

/// Reject snapshots the curve cannot be calibrated on.
pub fn validate_pool(pool: &PoolSnapshot) -> QuoteResult<()> {
    if pool.n_pt < 0 || pool.n_asset < 0 {
        return Err(QuoteError::InvalidPool("reserves must be non-negative"));
    }
    if pool.scalar_root_nano <= 0 {
        return Err(QuoteError::InvalidPool("scalar root must be positive"));
    }
    if pool.last_implied_rate_nano <= 0 {
        return Err(QuoteError::InvalidPool("last implied rate must be positive"));
    }
    Ok(())
}

// ─── Trade solvers ────────────────────────────────────────────────────────────

/// IB received for selling `delta_pt` PT into the pool.
pub fn pt_to_ib(pool: &PoolSnapshot, window: &MarketWindow, now: i64, delta_pt: i128) -> QuoteResult<i128> {
    let curve = CurveState::calibrate(pool, window, now)?;
    curve.sell_pt(delta_pt).map(|(d_ib, _)| d_ib)
}

/// PT received for paying `d_ib` IB into the pool.
///
/// Fails with [`QuoteError::RootNotFound`] when no trade size inside the pool's
/// asset reserve prices `d_ib`, or the search hits its iteration cap.
pub fn ib_to_pt(pool: &PoolSnapshot, window: &MarketWindow, now: i64, d_ib: i128) -> QuoteResult<i128> {
    let curve = CurveState::calibrate(pool, window, now)?;
    curve.buy_pt(d_ib).map(|(d_pt, _)| d_pt)
}

// ─── Utilities ────────────────────────────────────────────────────────────────

/// Direction in which a residual moves as the candidate grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slope {
    Rising,
    Falling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Root {
    pub value: i128,
    pub residual: i128,
    pub iterations: usize,
}

/// Integer bisection for a root of a monotone residual on [lower, upper].
///
/// `residual` returns `None` for a candidate outside the feasible state space,
/// which shrinks the upper bound without counting as a sign observation.
///
/// Returns early when |residual| <= TOLERANCE. On an integer grid with floored
/// residuals that rarely happens, so the usual exit is the bracket collapsing
/// between two adjacent evaluated candidates of opposite sign: the upper one is
/// returned, and its residual can be far larger than TOLERANCE. The result is
/// therefore an integer sign-change root, not a point where the residual is
/// within TOLERANCE of zero. Anything else, including running through
/// [`MAX_ITERATIONS`] steps, is [`QuoteError::RootNotFound`].
pub fn bisect<F>(mut lower: i128, mut upper: i128, slope: Slope, mut residual: F) -> QuoteResult<Root>
where
    F: FnMut(i128) -> QuoteResult<Option<i128>>,
{
    // Closest evaluated candidates on each side of the root
    let mut below: Option<i128> = None;
    let mut above: Option<(i128, i128)> = None;
    let mut iterations = 0;

    loop {
        if lower > upper {
            return match (below, above) {
                (Some(b), Some((a, f))) if a == b + 1 => Ok(Root { value: a, residual: f, iterations }),
                _ => Err(QuoteError::RootNotFound(iterations)),
            };
        }
        if iterations == MAX_ITERATIONS {
            return Err(QuoteError::RootNotFound(iterations));
        }
        iterations += 1;

        let mid = (lower + upper).div_euclid(2);
        let f = match residual(mid)? {
            Some(f) => f,
            None => {
                trace!("bisect[{iterations}]: {mid} out of range");
                upper = mid - 1;
                continue;
            }
        };
        trace!("bisect[{iterations}]: f({mid}) = {f}");

        if f.abs() <= TOLERANCE {
            return Ok(Root { value: mid, residual: f, iterations });
        }

        let root_is_higher = match slope {
            Slope::Falling => f > 0,
            Slope::Rising => f < 0,
        };
        if root_is_higher {
            lower = mid + 1;
            below = Some(mid);
        } else {
            upper = mid - 1;
            above = Some((mid, f));
        }
    }
}
