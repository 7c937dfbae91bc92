use chrono::NaiveDate;
use qsim_indicators::{crossovers, rsi_boundary_crossings, Crossover, RsiBoundaryCross, TechnicalIndicators};
use tracing::warn;

use crate::types::{Strategy, StrategyConfig, TradingSignal};

/// The date of the bar most recently pushed into `window`. `evaluate` is
/// always called after the current day's bar has been appended, so this
/// is always the bar being evaluated.
fn current_date(window: &TechnicalIndicators) -> NaiveDate {
    window
        .bars()
        .last()
        .expect("window has the current bar before evaluate is called")
        .date
}

/// Buys on a golden cross (short SMA crosses above long SMA) and sells on a
/// death cross (short SMA crosses below long SMA), evaluated over the last
/// two bars of each SMA series.
pub struct MovingAverageCrossover {
    short_period: usize,
    long_period: usize,
    config: StrategyConfig,
}

impl MovingAverageCrossover {
    pub fn new(short_period: usize, long_period: usize, config: StrategyConfig) -> Self {
        assert!(
            short_period < long_period,
            "short_period must be < long_period"
        );
        Self {
            short_period,
            long_period,
            config,
        }
    }
}

impl Strategy for MovingAverageCrossover {
    fn evaluate(
        &mut self,
        symbol: &str,
        window: &mut TechnicalIndicators,
        shares_held: i64,
        average_cost: f64,
        current_price: f64,
    ) -> TradingSignal {
        let date = current_date(window);
        if let Some(exit) = self.risk_exit(symbol, date, shares_held, average_cost, current_price) {
            return exit;
        }

        let short = match window.sma(self.short_period) {
            Ok(series) => series.to_vec(),
            Err(err) => {
                warn!(symbol, period = self.short_period, %err, "short sma unavailable");
                return TradingSignal::hold(symbol, date, current_price);
            }
        };
        let long = match window.sma(self.long_period) {
            Ok(series) => series.to_vec(),
            Err(err) => {
                warn!(symbol, period = self.long_period, %err, "long sma unavailable");
                return TradingSignal::hold(symbol, date, current_price);
            }
        };
        if short.len() < 2 {
            return TradingSignal::hold(symbol, date, current_price);
        }
        let crossing = crossovers(&short, &long);
        match crossing.last().copied().flatten() {
            Some(Crossover::Above) if shares_held == 0 => {
                TradingSignal::buy(symbol, date, current_price, "golden_cross")
            }
            Some(Crossover::Below) if shares_held > 0 => {
                TradingSignal::sell(symbol, date, current_price, "death_cross")
            }
            _ => TradingSignal::hold(symbol, date, current_price),
        }
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

/// Buys when RSI exits oversold territory and sells when it exits
/// overbought territory.
pub struct RsiStrategy {
    period: usize,
    oversold: f64,
    overbought: f64,
    config: StrategyConfig,
}

impl RsiStrategy {
    pub fn new(period: usize, oversold: f64, overbought: f64, config: StrategyConfig) -> Self {
        assert!(
            0.0 < oversold && oversold < overbought && overbought < 100.0,
            "RSI thresholds must satisfy 0 < oversold < overbought < 100"
        );
        Self {
            period,
            oversold,
            overbought,
            config,
        }
    }
}

impl Strategy for RsiStrategy {
    fn evaluate(
        &mut self,
        symbol: &str,
        window: &mut TechnicalIndicators,
        shares_held: i64,
        average_cost: f64,
        current_price: f64,
    ) -> TradingSignal {
        let date = current_date(window);
        if let Some(exit) = self.risk_exit(symbol, date, shares_held, average_cost, current_price) {
            return exit;
        }

        let rsi = match window.rsi(self.period) {
            Ok(series) => series.to_vec(),
            Err(err) => {
                warn!(symbol, period = self.period, %err, "rsi unavailable");
                return TradingSignal::hold(symbol, date, current_price);
            }
        };
        if rsi.len() < 2 {
            return TradingSignal::hold(symbol, date, current_price);
        }
        let crossings = rsi_boundary_crossings(&rsi, self.oversold, self.overbought);
        match crossings.last().copied().flatten() {
            Some(RsiBoundaryCross::ExitedOversold) if shares_held == 0 => {
                TradingSignal::buy(symbol, date, current_price, "rsi_oversold_exit")
            }
            Some(RsiBoundaryCross::ExitedOverbought) if shares_held > 0 => {
                TradingSignal::sell(symbol, date, current_price, "rsi_overbought_exit")
            }
            _ => TradingSignal::hold(symbol, date, current_price),
        }
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsim_indicators::PriceBar;

    fn bars(closes: &[f64]) -> TechnicalIndicators {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        TechnicalIndicators::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| PriceBar::new(start + chrono::Duration::days(i as i64), c, c, c, c, 1_000))
                .collect(),
        )
    }

    #[test]
    fn ma_crossover_buys_on_golden_cross() {
        let mut strategy = MovingAverageCrossover::new(2, 4, StrategyConfig::default());
        let mut window = bars(&[10.0, 10.0, 10.0, 10.0, 9.0, 15.0]);
        let signal = strategy.evaluate("AAPL", &mut window, 0, 0.0, 15.0);
        assert_eq!(signal.reason, "golden_cross");
    }

    #[test]
    fn ma_crossover_holds_without_existing_position_on_death_cross() {
        let mut strategy = MovingAverageCrossover::new(2, 4, StrategyConfig::default());
        let mut window = bars(&[15.0, 15.0, 15.0, 15.0, 16.0, 9.0]);
        let signal = strategy.evaluate("AAPL", &mut window, 0, 0.0, 9.0);
        assert_eq!(signal.reason, "no_signal");
    }

    #[test]
    fn risk_management_overrides_signal_on_stop_loss() {
        let config = StrategyConfig {
            enable_risk_management: true,
            stop_loss_pct: 0.05,
            take_profit_pct: 1.0,
            ..StrategyConfig::default()
        };
        let mut strategy = MovingAverageCrossover::new(2, 4, config);
        let mut window = bars(&[10.0, 10.0, 10.0, 10.0, 9.0, 15.0]);
        let signal = strategy.evaluate("AAPL", &mut window, 100, 20.0, 18.0);
        assert_eq!(signal.reason, "risk_exit");
    }

    #[test]
    fn rsi_buys_on_exit_from_oversold() {
        let mut strategy = RsiStrategy::new(3, 30.0, 70.0, StrategyConfig::default());
        // changes -1,-1,-1,2,2 over period 3: rsi goes 0.0 -> 50.0 -> 71.4,
        // crossing above the oversold=30 boundary on the 50.0 bar.
        let mut window = bars(&[10.0, 9.0, 8.0, 7.0, 9.0]);
        let signal = strategy.evaluate("AAPL", &mut window, 0, 0.0, 9.0);
        assert_eq!(signal.reason, "rsi_oversold_exit");
    }
}
