//! Error taxonomy of the pricing core.
//!
//! Every variant is terminal for the calculation that raised it. Nothing is
//! retried internally; a caller may retry with adjusted inputs.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("invalid proportion {0}: must lie strictly inside (0, PRECISION)")]
    InvalidProportion(i128),

    #[error("degenerate rate anchor {0}: calibrated anchor must be positive")]
    DegenerateAnchor(i128),

    #[error("negative exchange rate {0}")]
    NegativeExchangeRate(i128),

    #[error("root not found within {0} iterations")]
    RootNotFound(usize),

    #[error("invalid trade amount {0}")]
    InvalidAmount(i128),

    #[error("invalid pool snapshot: {0}")]
    InvalidPool(&'static str),

    #[error("fixed-point overflow")]
    Overflow,
}

pub type QuoteResult<T> = Result<T, QuoteError>;
