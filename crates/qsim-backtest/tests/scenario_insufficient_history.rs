//! A symbol with no bars at all in the requested date range is excluded
//! from the replay rather than failing the whole run, as long as at least
//! one other symbol has usable history. A symbol with *some* bars in range
//! but fewer than the strategy's lookback requirement is a fatal
//! misconfiguration: the run fails with a diagnostic `error_message`.

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
fn a_symbol_outside_the_date_range_is_excluded_not_fatal() {
    let closes: Vec<f64> = std::iter::repeat(10.0)
        .take(55)
        .chain([10.0, 11.0, 12.0, 13.0, 14.0])
        .collect();
    let store = InMemoryPriceStore::new()
        .with_symbol("AAPL", bars(date(2023, 1, 1), &closes))
        .with_symbol("MSFT", bars(date(2019, 1, 1), &closes));

    let config = BacktestConfig {
        symbols: vec!["AAPL".to_string(), "MSFT".to_string()],
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 1) + chrono::Duration::days(closes.len() as i64 - 1),
        starting_capital: 25_000.0,
        strategy: StrategySelection::MovingAverageCrossover {
            short_period: 1,
            long_period: 2,
        },
        strategy_config: StrategyConfig::default(),
        allocation: AllocationConfig::default(),
    };

    let result = BacktestEngine::new(config).run(&store);

    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.trades.iter().all(|t| t.symbol == "AAPL"));
}

#[test]
fn every_symbol_outside_range_fails_the_run() {
    let closes = [10.0, 11.0];
    let store = InMemoryPriceStore::new().with_symbol("MSFT", bars(date(2019, 1, 1), &closes));

    let config = BacktestConfig {
        symbols: vec!["MSFT".to_string()],
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 6),
        starting_capital: 25_000.0,
        strategy: StrategySelection::MovingAverageCrossover {
            short_period: 1,
            long_period: 2,
        },
        strategy_config: StrategyConfig::default(),
        allocation: AllocationConfig::default(),
    };

    let result = BacktestEngine::new(config).run(&store);
    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.error_message.is_some());
}

#[test]
fn fewer_bars_than_the_strategy_lookback_requires_fails_with_a_diagnostic_message() {
    let closes = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0];
    let store = InMemoryPriceStore::new().with_symbol("AAPL", bars(date(2023, 1, 1), &closes));

    let config = BacktestConfig {
        symbols: vec!["AAPL".to_string()],
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 10),
        starting_capital: 25_000.0,
        strategy: StrategySelection::MovingAverageCrossover {
            short_period: 10,
            long_period: 50,
        },
        strategy_config: StrategyConfig::default(),
        allocation: AllocationConfig::default(),
    };

    let result = BacktestEngine::new(config).run(&store);

    assert_eq!(result.status, RunStatus::Failed);
    let message = result.error_message.expect("a failed run must populate error_message");
    assert!(
        message.contains("insufficient history"),
        "expected an insufficient-history diagnostic, got: {message}"
    );
}
