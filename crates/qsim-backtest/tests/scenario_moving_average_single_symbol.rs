//! A single-symbol moving-average-crossover replay from a clean portfolio:
//! a golden cross should open a position and grow equity beyond the
//! starting capital once the position runs up.

use chrono::NaiveDate;
use qsim_backtest::{BacktestConfig, BacktestEngine, InMemoryPriceStore, RunStatus, StrategySelection};
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
fn golden_cross_opens_a_position_and_grows_equity() {
    let tail = [10.0, 10.0, 10.0, 10.0, 9.0, 14.0, 16.0, 18.0, 20.0];
    let closes: Vec<f64> = std::iter::repeat(10.0)
        .take(60 - tail.len())
        .chain(tail.iter().copied())
        .collect();
    let store = InMemoryPriceStore::new().with_symbol("AAPL", bars(date(2023, 1, 1), &closes));

    let config = BacktestConfig {
        symbols: vec!["AAPL".to_string()],
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 1) + chrono::Duration::days(closes.len() as i64),
        starting_capital: 50_000.0,
        strategy: StrategySelection::MovingAverageCrossover {
            short_period: 2,
            long_period: 4,
        },
        strategy_config: StrategyConfig::default(),
        allocation: AllocationConfig::default(),
    };

    let result = BacktestEngine::new(config).run(&store);

    assert_eq!(result.status, RunStatus::Completed);
    let buys: Vec<_> = result.trades.iter().filter(|t| t.action == SignalAction::Buy).collect();
    assert!(!buys.is_empty(), "expected at least one buy trade on the golden cross");
    assert!(result.equity_curve.last().unwrap().total_value > 50_000.0);
}
