//! A cancellation requested before the run starts should stop the replay at
//! the very first day boundary, producing a `Cancelled` result with no
//! equity samples or trades rather than an error.

use chrono::NaiveDate;
use qsim_backtest::{BacktestConfig, BacktestEngine, InMemoryPriceStore, RunStatus, StrategySelection};
use qsim_indicators::PriceBar;
use qsim_portfolio::AllocationConfig;
use qsim_strategy::StrategyConfig;

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
fn cancelling_before_the_first_day_yields_an_empty_cancelled_result() {
    let closes = vec![10.0; 60];
    let store = InMemoryPriceStore::new().with_symbol("AAPL", bars(date(2023, 1, 1), &closes));

    let config = BacktestConfig {
        symbols: vec!["AAPL".to_string()],
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 1) + chrono::Duration::days(60),
        starting_capital: 10_000.0,
        strategy: StrategySelection::MovingAverageCrossover {
            short_period: 5,
            long_period: 20,
        },
        strategy_config: StrategyConfig::default(),
        allocation: AllocationConfig::default(),
    };

    let engine = BacktestEngine::new(config);
    let token = engine.cancellation_token();
    token.cancel();

    let result = engine.run(&store);

    assert_eq!(result.status, RunStatus::Cancelled);
    assert!(result.equity_curve.is_empty());
    assert!(result.trades.is_empty());
    assert_eq!(result.metrics.total_trades, 0);
}
