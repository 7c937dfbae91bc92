//! When a held position's weight has drifted from its target by more than
//! the configured threshold, the engine tops it up toward target even
//! without a fresh strategy signal (since a sell is always a full exit, a
//! rebalance can only ever grow a position, never trim one).

use chrono::NaiveDate;
use qsim_backtest::{BacktestConfig, BacktestEngine, InMemoryPriceStore, StrategySelection};
use qsim_indicators::PriceBar;
use qsim_portfolio::AllocationConfig;
use qsim_strategy::{SignalAction, StrategyConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn bars(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::new(start + chrono::Duration::days(i as i64), c, c, c, c, 10_000))
        .collect()
}

#[test]
fn a_capped_initial_buy_tops_up_toward_target_on_later_rebalance_days() {
    // The golden cross fires once on day index 4; the price is flat before
    // and after, so the strategy itself never signals again. A tight
    // `max_position_increase_pct` caps the opening buy well below the
    // single-symbol equal-weight target of 100%, so every following
    // rebalance day (threshold 0, frequency 1) should top the position up
    // a little further without any new strategy signal.
    let tail = [10.0, 10.0, 10.0, 10.0, 12.0, 12.0, 12.0, 12.0, 12.0];
    let closes: Vec<f64> = std::iter::repeat(10.0)
        .take(60 - tail.len())
        .chain(tail.iter().copied())
        .collect();
    let store = InMemoryPriceStore::new().with_symbol("AAPL", bars(date(2023, 1, 1), &closes));

    let config = BacktestConfig {
        symbols: vec!["AAPL".to_string()],
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 1) + chrono::Duration::days(closes.len() as i64),
        starting_capital: 100_000.0,
        strategy: StrategySelection::MovingAverageCrossover {
            short_period: 2,
            long_period: 4,
        },
        strategy_config: StrategyConfig::default(),
        allocation: AllocationConfig {
            rebalance_frequency_days: 1,
            rebalance_drift_threshold: 0.0,
            max_position_increase_pct: 0.3,
            ..AllocationConfig::default()
        },
    };

    let result = BacktestEngine::new(config).run(&store);

    let golden_cross_buys: Vec<_> = result
        .trades
        .iter()
        .filter(|t| t.action == SignalAction::Buy && t.reason == "golden_cross")
        .collect();
    let topups: Vec<_> = result
        .trades
        .iter()
        .filter(|t| t.action == SignalAction::Buy && t.reason == "rebalance_topup")
        .collect();

    assert_eq!(golden_cross_buys.len(), 1, "exactly one strategy-driven entry");
    assert!(!topups.is_empty(), "capped entry should be topped up on later rebalance days");

    let final_shares: i64 = golden_cross_buys[0].shares + topups.iter().map(|t| t.shares).sum::<i64>();
    let final_position = result
        .per_symbol
        .get("AAPL")
        .expect("AAPL should appear in the per-symbol breakdown");
    // No sell ever fires in this scenario, so trade_count is exactly the
    // number of buys recorded above.
    assert_eq!(final_position.trade_count, golden_cross_buys.len() + topups.len());
    assert!(final_shares > golden_cross_buys[0].shares, "position should have grown past the capped entry");
}
