//! qsim-testkit
//!
//! Synthetic price-series generators and fixture builders shared by the
//! scenario tests across this workspace's crates. Deterministic by
//! construction (no randomness): every generator is a pure function of its
//! numeric parameters, so the same call always produces the same bars.

use chrono::NaiveDate;
use qsim_backtest::{BacktestConfig, InMemoryPriceStore, StrategySelection};
use qsim_indicators::PriceBar;
use qsim_portfolio::AllocationConfig;
use qsim_strategy::StrategyConfig;

/// A flat run of `days` bars at `price`, one per calendar day starting at
/// `start`. Useful as a baseline a caller then perturbs.
pub fn flat_series(start: NaiveDate, days: usize, price: f64) -> Vec<PriceBar> {
    (0..days)
        .map(|i| PriceBar::new(start + chrono::Duration::days(i as i64), price, price, price, price, 10_000))
        .collect()
}

/// `flat_bars` bars at `base_price`, then a step to `base_price *
/// (1.0 + jump_pct)` held for `trend_bars` more bars -- the minimal shape
/// that trips a moving-average golden cross once the short window has fully
/// rolled past the jump.
pub fn step_series(
    start: NaiveDate,
    base_price: f64,
    flat_bars: usize,
    jump_pct: f64,
    trend_bars: usize,
) -> Vec<PriceBar> {
    let mut closes = vec![base_price; flat_bars];
    closes.extend(std::iter::repeat(base_price * (1.0 + jump_pct)).take(trend_bars));
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::new(start + chrono::Duration::days(i as i64), c, c, c, c, 10_000))
        .collect()
}

/// A deterministic oscillation around `base_price`: a sine wave of
/// `amplitude_pct` superimposed on a linear `daily_drift_pct` trend. Gives
/// strategies enough texture to generate both buy and sell signals without
/// depending on any source of randomness.
pub fn oscillating_series(
    start: NaiveDate,
    days: usize,
    base_price: f64,
    amplitude_pct: f64,
    daily_drift_pct: f64,
    period_days: usize,
) -> Vec<PriceBar> {
    let period = period_days.max(1) as f64;
    (0..days)
        .map(|i| {
            let drift = base_price * daily_drift_pct * i as f64;
            let phase = 2.0 * std::f64::consts::PI * (i as f64) / period;
            let wave = base_price * amplitude_pct * phase.sin();
            let close = (base_price + drift + wave).max(0.01);
            PriceBar::new(start + chrono::Duration::days(i as i64), close, close, close, close, 10_000)
        })
        .collect()
}

/// Builds an [`InMemoryPriceStore`] from `(symbol, bars)` pairs in one call.
pub fn price_store(symbols: &[(&str, Vec<PriceBar>)]) -> InMemoryPriceStore {
    symbols
        .iter()
        .fold(InMemoryPriceStore::new(), |store, (symbol, bars)| {
            store.with_symbol(*symbol, bars.clone())
        })
}

/// A minimal, valid moving-average-crossover [`BacktestConfig`] over
/// `symbols`, spanning `[start, start + days]` with sensible defaults for
/// everything the caller doesn't care about.
pub fn minimal_moving_average_config(
    symbols: Vec<String>,
    start: NaiveDate,
    days: i64,
    starting_capital: f64,
) -> BacktestConfig {
    BacktestConfig {
        symbols,
        start_date: start,
        end_date: start + chrono::Duration::days(days),
        starting_capital,
        strategy: StrategySelection::MovingAverageCrossover {
            short_period: 5,
            long_period: 20,
        },
        strategy_config: StrategyConfig::default(),
        allocation: AllocationConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsim_backtest::PriceStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn step_series_jumps_exactly_once() {
        let bars = step_series(date(2023, 1, 1), 100.0, 4, 0.2, 4);
        assert_eq!(bars.len(), 8);
        assert_eq!(bars[3].close, 100.0);
        assert_eq!(bars[4].close, 120.0);
    }

    #[test]
    fn oscillating_series_is_reproducible() {
        let a = oscillating_series(date(2023, 1, 1), 30, 100.0, 0.05, 0.001, 10);
        let b = oscillating_series(date(2023, 1, 1), 30, 100.0, 0.05, 0.001, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn price_store_builder_covers_every_requested_symbol() {
        let aapl = flat_series(date(2023, 1, 1), 5, 10.0);
        let msft = flat_series(date(2023, 1, 1), 5, 50.0);
        let store = price_store(&[("AAPL", aapl), ("MSFT", msft)]);
        assert_eq!(store.list_symbols().len(), 2);
    }
}
