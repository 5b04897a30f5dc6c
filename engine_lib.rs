extern crate self as split_pricing;

pub mod accrual;
pub mod config;
pub mod curve;
pub mod error;
pub mod expiry;
pub mod ladder;
pub mod liquidity;
pub mod lock;
pub mod market;
pub mod quoter;
pub mod types;

pub use error::{QuoteError, QuoteResult};

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
