//! Proportional liquidity-provision quotes.
//!
//! LP tokens are a pro-rata claim on the pool's PT and IB balances, so every quote
//! here is a single ratio applied to the other reserves (floored).

use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, QuoteResult};
use crate::types::PoolSnapshot;

/// PT, IB and LP amounts moving together in one liquidity operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityQuote {
    pub pt: i128,
    pub ib: i128,
    pub lp: i128,
}

#[inline]
fn mul_div(amount: i128, numerator: i128, denominator: i128) -> QuoteResult<i128> {
    amount
        .checked_mul(numerator)
        .map(|n| n / denominator)
        .ok_or(QuoteError::Overflow)
}

fn require(amount: i128, reserve: i128, what: &'static str) -> QuoteResult<()> {
    if amount < 0 {
        return Err(QuoteError::InvalidAmount(amount));
    }
    if reserve <= 0 {
        return Err(QuoteError::InvalidPool(what));
    }
    Ok(())
}

/// PT and IB paid out for burning `lp_in` LP tokens.
pub fn redeem_lp(pool: &PoolSnapshot, lp_in: i128) -> QuoteResult<LiquidityQuote> {
    require(lp_in, pool.lp_supply, "pool has no LP supply")?;
    if lp_in > pool.lp_supply {
        return Err(QuoteError::InvalidAmount(lp_in));
    }
    Ok(LiquidityQuote {
        pt: mul_div(lp_in, pool.n_pt, pool.lp_supply)?,
        ib: mul_div(lp_in, pool.n_ib, pool.lp_supply)?,
        lp: lp_in,
    })
}

/// IB that must accompany `pt_in` PT, and the LP tokens minted for the pair.
pub fn provide_pt(pool: &PoolSnapshot, pt_in: i128) -> QuoteResult<LiquidityQuote> {
    require(pt_in, pool.n_pt, "pool has no PT reserve")?;
    Ok(LiquidityQuote {
        pt: pt_in,
        ib: mul_div(pt_in, pool.n_ib, pool.n_pt)?,
        lp: mul_div(pt_in, pool.lp_supply, pool.n_pt)?,
    })
}

/// PT that must accompany `ib_in` IB, and the LP tokens minted for the pair.
pub fn provide_ib(pool: &PoolSnapshot, ib_in: i128) -> QuoteResult<LiquidityQuote> {
    require(ib_in, pool.n_ib, "pool has no IB reserve")?;
    Ok(LiquidityQuote {
        pt: mul_div(ib_in, pool.n_pt, pool.n_ib)?,
        ib: ib_in,
        lp: mul_div(ib_in, pool.lp_supply, pool.n_ib)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolSnapshot {
        PoolSnapshot {
            n_ib: 800_000_000,
            lp_supply: 2_000_000_000,
            ..PoolSnapshot::new(1_000_000_000, 1_000_000_000, 100_000_000, 1_050_000_000)
        }
    }

    #[test]
    fn redeeming_a_tenth_returns_a_tenth() {
        let quote = redeem_lp(&pool(), 200_000_000).unwrap();
        assert_eq!(quote, LiquidityQuote { pt: 100_000_000, ib: 80_000_000, lp: 200_000_000 });
    }

    #[test]
    fn providing_either_side_is_symmetric() {
        let from_pt = provide_pt(&pool(), 50_000_000).unwrap();
        assert_eq!(from_pt, LiquidityQuote { pt: 50_000_000, ib: 40_000_000, lp: 100_000_000 });

        let from_ib = provide_ib(&pool(), from_pt.ib).unwrap();
        assert_eq!(from_ib, from_pt);
    }

    #[test]
    fn amounts_floor() {
        assert_eq!(provide_pt(&pool(), 3).unwrap(), LiquidityQuote { pt: 3, ib: 2, lp: 6 });
    }

    #[test]
    fn empty_sides_are_rejected() {
        let empty = PoolSnapshot::new(0, 0, 100_000_000, 1_050_000_000);
        assert!(matches!(redeem_lp(&empty, 1), Err(QuoteError::InvalidPool(_))));
        assert!(matches!(provide_pt(&empty, 1), Err(QuoteError::InvalidPool(_))));
        assert!(matches!(provide_ib(&empty, 1), Err(QuoteError::InvalidPool(_))));
    }

    #[test]
    fn over_redeeming_is_rejected() {
        assert_eq!(redeem_lp(&pool(), 2_000_000_001), Err(QuoteError::InvalidAmount(2_000_000_001)));
        assert_eq!(provide_ib(&pool(), -1), Err(QuoteError::InvalidAmount(-1)));
    }
}
