use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::QuoteResult;
use crate::types::{from_f64, MarketWindow, PoolSnapshot};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {field} = {value}: expected {expected}")]
    Invalid {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("unknown market {0}")]
    UnknownMarket(String),
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::Invalid { field, value: value.to_string(), expected }
    }
}

/// Quoting configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteConfig {
    /// Markets available to the quoter
    pub markets: Vec<MarketConfig>,
}

/// One PT/IB market and the pool snapshot to quote against.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    /// Market symbol used for lookup
    pub symbol: String,

    /// Decimals of the IB and PT mints
    pub decimals: u8,

    pub window: MarketWindow,

    pub pool: PoolConfig,
}

/// Pool reserves in base units; curve parameters in human units (1.0 = par).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    pub n_pt: u64,
    pub n_asset: u64,
    #[serde(default)]
    pub n_ib: u64,
    #[serde(default)]
    pub lp_supply: u64,
    pub scalar_root: f64,
    pub last_implied_rate: f64,
}

impl QuoteConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: QuoteConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markets.is_empty() {
            return Err(ConfigError::invalid("markets", "[]", "at least one market"));
        }

        let mut seen = HashSet::new();
        for market in &self.markets {
            market.validate()?;
            if !seen.insert(market.symbol.as_str()) {
                return Err(ConfigError::invalid("symbol", &market.symbol, "unique market symbols"));
            }
        }
        Ok(())
    }

    pub fn market(&self, symbol: &str) -> Result<&MarketConfig, ConfigError> {
        self.markets
            .iter()
            .find(|m| m.symbol == symbol)
            .ok_or_else(|| ConfigError::UnknownMarket(symbol.to_string()))
    }
}

impl MarketConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.is_empty() {
            return Err(ConfigError::invalid("symbol", "\"\"", "non-empty string"));
        }
        if self.decimals > 18 {
            return Err(ConfigError::invalid("decimals", self.decimals, "at most 18"));
        }
        if self.window.end_unix_ts <= self.window.start_unix_ts {
            return Err(ConfigError::invalid(
                "window.end_unix_ts",
                self.window.end_unix_ts,
                "later than window.start_unix_ts",
            ));
        }
        if self.pool.scalar_root.is_nan() || self.pool.scalar_root <= 0.0 {
            return Err(ConfigError::invalid("pool.scalar_root", self.pool.scalar_root, "greater than 0"));
        }
        if self.pool.last_implied_rate.is_nan() || self.pool.last_implied_rate <= 0.0 {
            return Err(ConfigError::invalid(
                "pool.last_implied_rate",
                self.pool.last_implied_rate,
                "greater than 0",
            ));
        }
        for (field, value) in [
            ("pool.scalar_root", self.pool.scalar_root),
            ("pool.last_implied_rate", self.pool.last_implied_rate),
        ] {
            if from_f64(value).is_err() {
                return Err(ConfigError::invalid(field, value, "a finite fixed-point value"));
            }
        }
        if self.pool.last_implied_rate < 1.0 {
            warn!(
                "{}: last implied rate {} is below par, PT trades above IB",
                self.symbol, self.pool.last_implied_rate
            );
        }
        Ok(())
    }

    pub fn snapshot(&self) -> QuoteResult<PoolSnapshot> {
        Ok(PoolSnapshot {
            n_ib: self.pool.n_ib as i128,
            lp_supply: self.pool.lp_supply as i128,
            ..PoolSnapshot::new(
                self.pool.n_pt as i128,
                self.pool.n_asset as i128,
                from_f64(self.pool.scalar_root)?,
                from_f64(self.pool.last_implied_rate)?,
            )
        })
    }

    /// Human amount to base units, rounded to the nearest unit.
    pub fn to_base_units(&self, amount: f64) -> i128 {
        (amount * 10f64.powi(self.decimals as i32)).round() as i128
    }

    pub fn from_base_units(&self, amount: i128) -> f64 {
        amount as f64 / 10f64.powi(self.decimals as i32)
    }
}
