//! Depth ladder: PT→IB quotes for many trade sizes against one snapshot.
//!
//! Each rung is an independent pure calculation, so the ladder is evaluated in
//! parallel. A failing rung (e.g. a size that drains the asset side) is recorded
//! with its error instead of aborting the whole ladder.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{QuoteError, QuoteResult};
use crate::market::CurveState;
use crate::quoter::Quoter;
use crate::types::{to_f64, PRECISION};

// ─── Ladder Result ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LadderRung {
    pub delta_pt: i128,
    pub d_ib: Option<i128>,
    /// Marginal rate after the trade
    pub exchange_rate_nano: Option<i128>,
    /// Average rate paid over the whole trade: deltaPt · PRECISION / dIb
    pub effective_rate_nano: Option<i128>,
    /// Effective rate against the pre-trade spot rate, in basis points
    pub slippage_bps: Option<f64>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ladder {
    pub spot_rate_nano: i128,
    pub rate_anchor_nano: i128,
    pub rungs: Vec<LadderRung>,
    pub max_slippage_bps: f64,
    pub failed: usize,
}

// ─── Parallel evaluation ──────────────────────────────────────────────────────

/// Quote every size in `sizes`, in parallel, preserving order.
pub fn quote_ladder(quoter: &Quoter, sizes: &[i128]) -> QuoteResult<Ladder> {
    let curve = quoter.curve()?;
    let spot = curve.spot_rate()?;

    let rungs: Vec<LadderRung> = sizes
        .par_iter()
        .map(|&delta_pt| quote_rung(&curve, spot, delta_pt))
        .collect();

    let max_slippage_bps = rungs
        .iter()
        .filter_map(|r| r.slippage_bps)
        .fold(0.0_f64, f64::max);
    let failed = rungs.iter().filter(|r| r.error.is_some()).count();

    Ok(Ladder {
        spot_rate_nano: spot,
        rate_anchor_nano: curve.rate_anchor_nano,
        rungs,
        max_slippage_bps,
        failed,
    })
}

/// deltaPt · PRECISION / dIb, or `None` when the trade returned no IB.
pub fn effective_rate_nano(delta_pt: i128, d_ib: i128) -> QuoteResult<Option<i128>> {
    if d_ib <= 0 {
        return Ok(None);
    }
    delta_pt
        .checked_mul(PRECISION)
        .map(|n| Some(n / d_ib))
        .ok_or(QuoteError::Overflow)
}

fn quote_rung(curve: &CurveState, spot_rate_nano: i128, delta_pt: i128) -> LadderRung {
    let quoted = curve
        .sell_pt(delta_pt)
        .and_then(|(d_ib, rate)| Ok((d_ib, rate, effective_rate_nano(delta_pt, d_ib)?)));
    match quoted {
        Ok((d_ib, rate, effective)) => LadderRung {
            delta_pt,
            d_ib: Some(d_ib),
            exchange_rate_nano: Some(rate),
            effective_rate_nano: effective,
            slippage_bps: effective.map(|e| (to_f64(e) / to_f64(spot_rate_nano) - 1.0) * 10_000.0),
            error: None,
        },
        Err(e) => LadderRung {
            delta_pt,
            d_ib: None,
            exchange_rate_nano: None,
            effective_rate_nano: None,
            slippage_bps: None,
            error: Some(e.to_string()),
        },
    }
}

/// `steps` evenly spaced sizes from `max / steps` up to `max`.
pub fn linear_sizes(max: i128, steps: usize) -> Vec<i128> {
    if steps == 0 {
        return vec![];
    }
    (1..=steps as i128).map(|i| max * i / steps as i128).collect()
}
