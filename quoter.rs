use log::warn;

use crate::accrual::{base_per_ib_nano, mint_pt_yt, redeem_ib};
use crate::error::QuoteResult;
use crate::lock::required_lock_amount;
use crate::market::CurveState;
use crate::types::{LockQuote, MarketWindow, PoolSnapshot, SwapQuote, TradeDirection, TradeRequest};

/// One pool snapshot bound to a market window and a quoting time.
///
/// Holds plain values only; a `Quoter` can be shared freely across threads.
#[derive(Clone, Copy, Debug)]
pub struct Quoter {
    pub window: MarketWindow,
    pub pool: PoolSnapshot,
    pub now: i64,
}

impl Quoter {
    pub fn new(window: MarketWindow, pool: PoolSnapshot, now: i64) -> Self {
        if window.is_matured(now) {
            warn!(
                "quoting at {} on a market that matured at {}: swaps saturate at par",
                now, window.end_unix_ts
            );
        }
        Self { window, pool, now }
    }

    pub fn curve(&self) -> QuoteResult<CurveState> {
        CurveState::calibrate(&self.pool, &self.window, self.now)
    }

    pub fn swap(&self, request: &TradeRequest) -> QuoteResult<SwapQuote> {
        let curve = self.curve()?;
        let (amount_out, exchange_rate_nano) = match request.direction {
            TradeDirection::PtToIb => curve.sell_pt(request.amount)?,
            TradeDirection::IbToPt => curve.buy_pt(request.amount)?,
        };

        Ok(SwapQuote {
            direction: request.direction,
            amount_in: request.amount,
            amount_out,
            exchange_rate_nano,
            rate_anchor_nano: curve.rate_anchor_nano,
            implied_rate_nano: curve.implied_rate(exchange_rate_nano)?,
        })
    }

    pub fn base_per_ib_nano(&self) -> QuoteResult<i128> {
        base_per_ib_nano(self.now, self.window.start_unix_ts)
    }

    /// Lock quote for a merchant payment, accruing IB from the market start.
    pub fn lock(&self, target_amount: i128) -> QuoteResult<LockQuote> {
        required_lock_amount(target_amount, self.now, &self.window, self.base_per_ib_nano()?, &self.pool)
    }

    pub fn mint(&self, ib_in: i128) -> QuoteResult<i128> {
        mint_pt_yt(ib_in, self.base_per_ib_nano()?)
    }

    pub fn redeem(&self, pt_yt_in: i128) -> QuoteResult<i128> {
        redeem_ib(pt_yt_in, self.base_per_ib_nano()?)
    }
}
