use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use split_pricing::config::{MarketConfig, QuoteConfig};
use split_pricing::ladder::{linear_sizes, quote_ladder};
use split_pricing::liquidity::{provide_ib, provide_pt, redeem_lp};
use split_pricing::quoter::Quoter;
use split_pricing::types::{to_f64, TradeRequest};

#[derive(Parser)]
#[command(name = "split-quote", about = "Quote PT/IB swaps, merchant locks and accrual on yield-split markets")]
struct Cli {
	/// Markets file
	#[arg(short, long, global = true, default_value = "markets.toml")]
	config: PathBuf,

	/// Quote time as a unix timestamp (defaults to the system clock)
	#[arg(long, global = true)]
	now: Option<i64>,

	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Check that every configured market calibrates and prices monotonically
	Validate,
	Swap {
		#[arg(long)]
		market: String,
		#[arg(long, value_enum)]
		direction: Direction,
		#[arg(long)]
		amount: f64,
	},
	/// IB a customer must lock for the merchant to net `amount`
	Lock {
		#[arg(long)]
		market: String,
		#[arg(long)]
		amount: f64,
	},
	Mint {
		#[arg(long)]
		market: String,
		#[arg(long)]
		amount: f64,
	},
	Redeem {
		#[arg(long)]
		market: String,
		#[arg(long)]
		amount: f64,
	},
	/// Proportional deposit or withdrawal of pool liquidity
	Liquidity {
		#[arg(long)]
		market: String,
		#[arg(long, value_enum)]
		side: LiquiditySide,
		#[arg(long)]
		amount: f64,
	},
	/// PT→IB quotes at evenly spaced sizes up to `max`
	Ladder {
		#[arg(long)]
		market: String,
		#[arg(long)]
		max: f64,
		#[arg(long, default_value_t = 10)]
		steps: usize,
	},
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
	PtToIb,
	IbToPt,
}

#[derive(Clone, Copy, ValueEnum)]
enum LiquiditySide {
	/// Deposit PT with matching IB
	Pt,
	/// Deposit IB with matching PT
	Ib,
	/// Burn LP tokens
	Lp,
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::from_env(
		env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }),
	)
	.init();

	let config = QuoteConfig::load(&cli.config)
		.with_context(|| format!("loading markets from {}", cli.config.display()))?;
	let now = match cli.now {
		Some(ts) => ts,
		None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64,
	};
	log::debug!("quoting {} markets at {}", config.markets.len(), now);

	let payload = match cli.command {
		Commands::Validate => validate_cmd(&config, now)?,
		Commands::Swap { market, direction, amount } => swap_cmd(&config, now, &market, direction, amount)?,
		Commands::Lock { market, amount } => lock_cmd(&config, now, &market, amount)?,
		Commands::Mint { market, amount } => accrual_cmd(&config, now, &market, amount, true)?,
		Commands::Redeem { market, amount } => accrual_cmd(&config, now, &market, amount, false)?,
		Commands::Liquidity { market, side, amount } => liquidity_cmd(&config, &market, side, amount)?,
		Commands::Ladder { market, max, steps } => ladder_cmd(&config, now, &market, max, steps)?,
	};

	println!("{}", serde_json::to_string_pretty(&payload)?);
	Ok(())
}

fn quoter(market: &MarketConfig, now: i64) -> Result<Quoter> {
	let pool = market
		.snapshot()
		.with_context(|| format!("{} pool parameters do not fit fixed point", market.symbol))?;
	Ok(Quoter::new(market.window, pool, now))
}

/// `json!` panics on values it cannot represent; i128 amounts past the i64/u64
/// range are one, so quote structs go through here first.
fn to_json<T: Serialize>(value: &T) -> Result<Value> {
	serde_json::to_value(value).context("quote does not fit in JSON numbers")
}

fn positive_units(market: &MarketConfig, amount: f64) -> Result<i128> {
	let units = market.to_base_units(amount);
	if units <= 0 {
		bail!("amount {} is below one base unit of {}", amount, market.symbol);
	}
	Ok(units)
}

fn validate_cmd(config: &QuoteConfig, now: i64) -> Result<Value> {
	let mut checked = Vec::with_capacity(config.markets.len());

	for market in &config.markets {
		let q = quoter(market, now)?;
		let curve = q
			.curve()
			.with_context(|| format!("{} failed to calibrate", market.symbol))?;
		let spot = curve.spot_rate()?;

		let small = q.pool.n_asset / 1_000;
		if small == 0 {
			bail!("{} has too little asset reserve to quote", market.symbol);
		}
		let (out_small, _) = curve.sell_pt(small)?;
		let (out_large, _) = curve.sell_pt(5 * small)?;
		if out_small == 0 || out_large == 0 {
			bail!("{} produced zero output on validation quotes", market.symbol);
		}
		if out_large <= out_small {
			bail!("{} failed monotonicity check", market.symbol);
		}

		eprintln!("[PASS] {}", market.symbol);
		checked.push(json!({
			"market": market.symbol,
			"matured": market.window.is_matured(now),
			"spot_rate": to_f64(spot),
			"rate_anchor": to_f64(curve.rate_anchor_nano),
			"implied_rate": curve.implied_rate(spot)?.map(to_f64),
		}));
	}

	Ok(json!({ "now": now, "markets": checked }))
}

fn swap_cmd(config: &QuoteConfig, now: i64, symbol: &str, direction: Direction, amount: f64) -> Result<Value> {
	let market = config.market(symbol)?;
	let units = positive_units(market, amount)?;
	let request = match direction {
		Direction::PtToIb => TradeRequest::pt_to_ib(units),
		Direction::IbToPt => TradeRequest::ib_to_pt(units),
	};

	let quote = quoter(market, now)?.swap(&request)?;
	Ok(json!({
		"market": market.symbol,
		"now": now,
		"amount_in": market.from_base_units(quote.amount_in),
		"amount_out": market.from_base_units(quote.amount_out),
		"exchange_rate": to_f64(quote.exchange_rate_nano),
		"implied_rate": quote.implied_rate_nano.map(to_f64),
		"quote": to_json(&quote)?,
	}))
}

fn lock_cmd(config: &QuoteConfig, now: i64, symbol: &str, amount: f64) -> Result<Value> {
	let market = config.market(symbol)?;
	let q = quoter(market, now)?;
	let quote = q.lock(positive_units(market, amount)?)?;
	Ok(json!({
		"market": market.symbol,
		"now": now,
		"base_per_ib": to_f64(q.base_per_ib_nano()?),
		"required_lock_amount": market.from_base_units(quote.required_lock_amount),
		"merchant_portion": market.from_base_units(quote.merchant_portion),
		"amm_sold_portion": market.from_base_units(quote.amm_sold_portion),
		"quote": to_json(&quote)?,
	}))
}

fn accrual_cmd(config: &QuoteConfig, now: i64, symbol: &str, amount: f64, mint: bool) -> Result<Value> {
	let market = config.market(symbol)?;
	let q = quoter(market, now)?;
	let units = positive_units(market, amount)?;
	let (action, out) = if mint {
		("mint", q.mint(units)?)
	} else {
		("redeem", q.redeem(units)?)
	};
	Ok(json!({
		"market": market.symbol,
		"now": now,
		"base_per_ib": to_f64(q.base_per_ib_nano()?),
		"action": action,
		"amount_in": market.from_base_units(units),
		"amount_out": market.from_base_units(out),
	}))
}

fn liquidity_cmd(config: &QuoteConfig, symbol: &str, side: LiquiditySide, amount: f64) -> Result<Value> {
	let market = config.market(symbol)?;
	let pool = market.snapshot()?;
	let units = positive_units(market, amount)?;
	let (action, quote) = match side {
		LiquiditySide::Pt => ("provide", provide_pt(&pool, units)?),
		LiquiditySide::Ib => ("provide", provide_ib(&pool, units)?),
		LiquiditySide::Lp => ("withdraw", redeem_lp(&pool, units)?),
	};
	Ok(json!({
		"market": market.symbol,
		"action": action,
		"pt": market.from_base_units(quote.pt),
		"ib": market.from_base_units(quote.ib),
		"lp": market.from_base_units(quote.lp),
	}))
}

fn ladder_cmd(config: &QuoteConfig, now: i64, symbol: &str, max: f64, steps: usize) -> Result<Value> {
	if steps == 0 {
		bail!("ladder needs at least one step");
	}
	let market = config.market(symbol)?;
	let sizes = linear_sizes(positive_units(market, max)?, steps);
	let ladder = quote_ladder(&quoter(market, now)?, &sizes)?;

	if ladder.failed > 0 {
		log::warn!("{} of {} ladder rungs failed", ladder.failed, sizes.len());
	}
	Ok(json!({
		"market": market.symbol,
		"now": now,
		"spot_rate": to_f64(ladder.spot_rate_nano),
		"ladder": to_json(&ladder)?,
	}))
}
