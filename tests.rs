//! Cross-module checks of the pricing core: the reference market scenario,
//! monotonicity and round-trip properties, and a seeded sweep over random pools.

#[cfg(test)]
mod integration {
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use split_pricing::config::QuoteConfig;
    use split_pricing::curve::{exchange_rate_target_nano, ln_odds_nano, proportion_nano, update_rate_anchor};
    use split_pricing::expiry::years_to_expiry_nano;
    use split_pricing::ladder::{linear_sizes, quote_ladder};
    use split_pricing::lock::required_lock_amount;
    use split_pricing::market::{ib_to_pt, pt_to_ib, CurveState};
    use split_pricing::quoter::Quoter;
    use split_pricing::types::{MarketWindow, PoolSnapshot, TradeRequest, MAX_ITERATIONS, PRECISION, SECONDS_PER_YEAR};
    use split_pricing::QuoteError;

    const END: i64 = 1_800_000_000;
    const ONE_YEAR_OUT: i64 = END - SECONDS_PER_YEAR;

    fn window() -> MarketWindow {
        MarketWindow::new(END - 2 * SECONDS_PER_YEAR, END)
    }

    /// Balanced pool, 5% last implied rate, shallow scalar root.
    fn pool() -> PoolSnapshot {
        PoolSnapshot::new(1_000_000_000, 1_000_000_000, 100_000_000, 1_050_000_000)
    }

    fn curve() -> CurveState {
        CurveState::calibrate(&pool(), &window(), ONE_YEAR_OUT).unwrap()
    }

    // ── Scenario: one year out at 5% ──────────────────────────────────────────

    #[test]
    fn one_year_five_percent_market() {
        let anchor = update_rate_anchor(
            pool().n_pt,
            pool().n_asset,
            pool().scalar_root_nano,
            pool().last_implied_rate_nano,
            END,
            ONE_YEAR_OUT,
        )
        .unwrap();
        assert!(anchor > 0);
        assert!((anchor - PRECISION).abs() < PRECISION / 10, "anchor={anchor}");

        let d_ib = pt_to_ib(&pool(), &window(), ONE_YEAR_OUT, 1_000_000).unwrap();
        assert_eq!(d_ib, 934_579);
        assert!(d_ib < 1_000_000, "PT must trade below par before maturity");
    }

    #[test]
    fn quoter_matches_free_functions() {
        let q = Quoter::new(window(), pool(), ONE_YEAR_OUT);
        let quote = q.swap(&TradeRequest::ib_to_pt(934_579)).unwrap();
        assert_eq!(Ok(quote.amount_out), ib_to_pt(&pool(), &window(), ONE_YEAR_OUT, 934_579));
        assert_eq!(quote.amount_out, 1_000_000);
    }

    // ── Properties: monotonicity and round trip ───────────────────────────────

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn selling_more_pt_returns_more_ib(
            delta_pt in 1i128..50_000_000,
            step in 1_000i128..1_000_000
        ) {
            let small = pt_to_ib(&pool(), &window(), ONE_YEAR_OUT, delta_pt).unwrap();
            let large = pt_to_ib(&pool(), &window(), ONE_YEAR_OUT, delta_pt + step).unwrap();
            prop_assert!(large > small, "{} -> {}, {} -> {}", delta_pt, small, delta_pt + step, large);
        }

        #[test]
        fn buy_back_recovers_sold_pt(delta_pt in 1i128..=100_000_000) {
            let d_ib = pt_to_ib(&pool(), &window(), ONE_YEAR_OUT, delta_pt).unwrap();
            let back = ib_to_pt(&pool(), &window(), ONE_YEAR_OUT, d_ib).unwrap();
            let slack = delta_pt / 10_000_000 + 8;
            prop_assert!((back - delta_pt).abs() <= slack, "sold {} got back {}", delta_pt, back);
        }

        #[test]
        fn curve_rate_never_falls_as_pt_enters(a in 0i128..900_000_000, b in 0i128..900_000_000) {
            let c = curve();
            let (lo, hi) = (a.min(b), a.max(b));
            prop_assert!(c.rate_after(lo).unwrap() <= c.rate_after(hi).unwrap());
        }

        #[test]
        fn buy_residual_falls_with_candidate(
            d_ib in 1i128..5_000_000,
            a in 0i128..500_000_000,
            gap in 1i128..1_000_000
        ) {
            let c = curve();
            let residual = |d_pt: i128| c.rate_after(d_pt).unwrap() - (d_pt * PRECISION).div_euclid(d_ib);
            prop_assert!(residual(a) > residual(a + gap));
        }

        #[test]
        fn merchant_always_nets_target(target in 10_000i128..10_000_000, accrued in any::<bool>()) {
            let base = if accrued { 1_200_000_000 } else { PRECISION };
            let quote = required_lock_amount(target, ONE_YEAR_OUT, &window(), base, &pool()).unwrap();
            prop_assert!((quote.merchant_portion - target).abs() <= 1, "{:?}", quote);
        }

        #[test]
        fn proportions_are_complementary(n_pt in 1i128..1_000_000_000_000, n_asset in 1i128..1_000_000_000_000) {
            let sum = proportion_nano(n_pt, n_asset) + proportion_nano(n_asset, n_pt);
            prop_assert!(sum == PRECISION || sum == PRECISION - 1);

            let p = proportion_nano(n_pt, n_asset);
            if p > 0 && p < PRECISION {
                let lhs = ln_odds_nano(p).unwrap();
                let rhs = ln_odds_nano(PRECISION - p).unwrap();
                prop_assert!((lhs + rhs).abs() <= 1);
            }
        }
    }

    // ── Sweep: random pool states ─────────────────────────────────────────────

    #[test]
    fn random_pools_calibrate_and_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut calibrated = 0;
        let runs = 2_000;

        for _ in 0..runs {
            let pool = PoolSnapshot::new(
                rng.gen_range(100_000_000i128..=100_000_000_000),
                rng.gen_range(100_000_000i128..=100_000_000_000),
                rng.gen_range(50_000_000i128..=5_000_000_000),
                rng.gen_range(PRECISION..=1_300_000_000),
            );
            let now = END - rng.gen_range(86_400i64..=2 * SECONDS_PER_YEAR);

            // Steep curves on skewed pools legitimately fail calibration
            let Ok(curve) = CurveState::calibrate(&pool, &window(), now) else {
                continue;
            };
            calibrated += 1;

            let years = years_to_expiry_nano(END, now);
            assert_eq!(
                curve.spot_rate().unwrap(),
                exchange_rate_target_nano(pool.last_implied_rate_nano, years).unwrap(),
                "pre-trade rate must reproduce the last implied rate: {pool:?}"
            );

            let delta_pt = rng.gen_range(1..=(pool.n_asset / 100).max(1));
            let (d_ib, _) = curve.sell_pt(delta_pt).unwrap();
            let (back, _) = curve.buy_pt(d_ib).unwrap();
            assert!(
                (back - delta_pt).abs() <= delta_pt / 1_000_000 + 10,
                "sold {delta_pt} got back {back} on {pool:?} at {now}"
            );
        }

        assert!(calibrated > runs / 2, "only {calibrated} of {runs} pools calibrated");
    }

    // ── Bounded search ────────────────────────────────────────────────────────

    #[test]
    fn infeasible_searches_stop_within_iteration_cap() {
        let result = ib_to_pt(&pool(), &window(), ONE_YEAR_OUT, 1_000_000_000_000_000_000);
        assert!(matches!(result, Err(QuoteError::RootNotFound(n)) if n <= MAX_ITERATIONS), "{result:?}");

        let result = required_lock_amount(1_000_000_000_000, ONE_YEAR_OUT, &window(), PRECISION, &pool());
        assert!(matches!(result, Err(QuoteError::RootNotFound(n)) if n <= MAX_ITERATIONS), "{result:?}");
    }

    // ── Maturity ──────────────────────────────────────────────────────────────

    #[test]
    fn time_left_clamps_at_maturity() {
        for late in [0, 1, SECONDS_PER_YEAR] {
            assert_eq!(years_to_expiry_nano(END, END + late), 0);
            assert_eq!(pt_to_ib(&pool(), &window(), END + late, 123_456), Ok(123_456));
            assert_eq!(ib_to_pt(&pool(), &window(), END + late, 123_456), Ok(123_456));
        }
    }

    // ── Config → ladder ───────────────────────────────────────────────────────

    #[test]
    fn ladder_from_config_file() {
        let path = std::env::temp_dir().join(format!("split-pricing-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
            [[markets]]
            symbol = "sSOL-TEST"
            decimals = 9

            [markets.window]
            start_unix_ts = 1736928000
            end_unix_ts = 1800000000

            [markets.pool]
            n_pt = 1000000000
            n_asset = 1000000000
            scalar_root = 0.1
            last_implied_rate = 1.05
            "#,
        )
        .unwrap();
        let config = QuoteConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        let market = config.market("sSOL-TEST").unwrap();
        assert_eq!(market.snapshot(), Ok(pool()));

        let quoter = Quoter::new(market.window, market.snapshot().unwrap(), ONE_YEAR_OUT);
        let sizes = linear_sizes(market.to_base_units(0.01), 5);
        let ladder = quote_ladder(&quoter, &sizes).unwrap();

        assert_eq!(ladder.failed, 0);
        assert_eq!(ladder.rungs[0].d_ib, Some(quoter.swap(&TradeRequest::pt_to_ib(sizes[0])).unwrap().amount_out));
        let outputs: Vec<i128> = ladder.rungs.iter().filter_map(|r| r.d_ib).collect();
        for w in outputs.windows(2) {
            assert!(w[1] > w[0], "ladder outputs not increasing: {outputs:?}");
        }
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = QuoteConfig::load("/nonexistent/markets.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/markets.toml"));
    }
}
