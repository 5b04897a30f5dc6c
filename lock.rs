use log::debug;

use crate::error::{QuoteError, QuoteResult};
use crate::market::{bisect, CurveState, Slope};
use crate::types::{LockQuote, MarketWindow, PoolSnapshot, PRECISION};

/// IB a customer must lock so that a merchant nets `target_amount` IB.
///
/// The locked IB is split into PT+YT at `base_per_ib_nano`; the PT side is sold into
/// the pool and the merchant keeps whatever IB is left over:
///
///   merchant(c) = c - ptToIb(c · basePerIb)
///
/// Bisection over c ∈ [target, n_pt / basePerIb] on f(c) = merchant(c) - target,
/// which rises with c. Candidates whose minted PT would drain the pool's asset side
/// shrink the upper bound.
pub fn required_lock_amount(
    target_amount: i128,
    current_unix_ts: i64,
    window: &MarketWindow,
    base_per_ib_nano: i128,
    pool: &PoolSnapshot,
) -> QuoteResult<LockQuote> {
    if target_amount <= 0 {
        return Err(QuoteError::InvalidAmount(target_amount));
    }
    if base_per_ib_nano <= 0 {
        return Err(QuoteError::InvalidAmount(base_per_ib_nano));
    }

    let curve = CurveState::calibrate(pool, window, current_unix_ts)?;
    let minted = |locked: i128| locked * base_per_ib_nano / PRECISION;
    let upper = pool.n_pt * PRECISION / base_per_ib_nano;

    let root = bisect(target_amount, upper, Slope::Rising, |locked| {
        let pt = minted(locked);
        if curve.n_asset - pt <= 0 {
            return Ok(None);
        }
        let (sold, _) = curve.sell_pt(pt)?;
        Ok(Some(locked - sold - target_amount))
    })?;

    let (amm_sold_portion, _) = curve.sell_pt(minted(root.value))?;
    debug!(
        "required_lock_amount: target={} -> lock={} sold={} ({} iterations)",
        target_amount, root.value, amm_sold_portion, root.iterations
    );

    Ok(LockQuote {
        required_lock_amount: root.value,
        merchant_portion: root.value - amm_sold_portion,
        amm_sold_portion,
    })
}
