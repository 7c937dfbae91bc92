//! Turns a raw equity curve and trade log into the final performance and
//! risk statistics, plus the serializable [`BacktestResult`] report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use qsim_strategy::SignalAction;
use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Stands in for an unbounded profit factor (wins with zero losses). Kept
/// finite so the result round-trips through JSON, which has no infinity
/// literal.
const PROFIT_FACTOR_SENTINEL: f64 = 1.0e9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquitySample {
    pub date: NaiveDate,
    pub total_value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: SignalAction,
    pub shares: i64,
    pub price: f64,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub volatility_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub total_trades: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerSymbolStats {
    pub trade_count: usize,
    pub realized_pnl: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub status: RunStatus,
    pub equity_curve: Vec<EquitySample>,
    pub trades: Vec<TradeRecord>,
    pub metrics: PerformanceMetrics,
    pub per_symbol: BTreeMap<String, PerSymbolStats>,
    /// Populated iff `status == Failed`; `None` for `Completed`/`Cancelled`.
    pub error_message: Option<String>,
}

pub struct ResultCalculator {
    risk_free_rate: f64,
}

impl ResultCalculator {
    pub fn new() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn compute(
        &self,
        status: RunStatus,
        equity_curve: &[EquitySample],
        trades: &[TradeRecord],
    ) -> BacktestResult {
        let metrics = self.compute_metrics(equity_curve, trades);
        let per_symbol = compute_per_symbol(trades);
        BacktestResult {
            status,
            equity_curve: equity_curve.to_vec(),
            trades: trades.to_vec(),
            metrics,
            per_symbol,
            error_message: None,
        }
    }

    /// Builds a well-formed `Failed` result with no samples, for fatal
    /// errors that abort the replay before (or during) it runs.
    pub fn failed(&self, error_message: String) -> BacktestResult {
        let mut result = self.compute(RunStatus::Failed, &[], &[]);
        result.error_message = Some(error_message);
        result
    }

    fn compute_metrics(&self, equity_curve: &[EquitySample], trades: &[TradeRecord]) -> PerformanceMetrics {
        let values: Vec<f64> = equity_curve.iter().map(|s| s.total_value).collect();
        let total_return_pct = total_return(&values);
        let daily_returns = daily_returns(&values);
        let volatility = stdev(&daily_returns) * TRADING_DAYS_PER_YEAR.sqrt();
        let mean_daily = mean(&daily_returns);
        let sharpe_ratio = if volatility == 0.0 {
            0.0
        } else {
            (mean_daily * TRADING_DAYS_PER_YEAR - self.risk_free_rate) / volatility
        };
        let max_drawdown_pct = max_drawdown(&values);
        let annualized_return_pct = annualized_return(equity_curve);

        let round_trips = round_trip_pnls(trades);
        let wins: Vec<f64> = round_trips.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = round_trips.iter().copied().filter(|p| *p < 0.0).collect();
        let win_rate = if round_trips.is_empty() {
            0.0
        } else {
            wins.len() as f64 / round_trips.len() as f64
        };
        let profit_factor = {
            let gross_win: f64 = wins.iter().sum();
            let gross_loss: f64 = losses.iter().map(|l| l.abs()).sum();
            if gross_loss == 0.0 {
                if gross_win > 0.0 {
                    PROFIT_FACTOR_SENTINEL
                } else {
                    0.0
                }
            } else {
                gross_win / gross_loss
            }
        };
        let average_win = mean(&wins);
        let average_loss = mean(&losses);

        PerformanceMetrics {
            total_return_pct,
            annualized_return_pct,
            volatility_pct: volatility,
            sharpe_ratio,
            max_drawdown_pct,
            win_rate,
            profit_factor,
            average_win,
            average_loss,
            total_trades: trades.len(),
        }
    }
}

impl Default for ResultCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if *first != 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Negative (or zero): the largest peak-to-trough decline observed in the
/// equity curve, as a fraction of the peak.
fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let drawdown = v / peak - 1.0;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }
    worst
}

/// Annualizes the total return using true calendar-day elapsed time between
/// the first and last equity sample, not a trading-day placeholder.
fn annualized_return(equity_curve: &[EquitySample]) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    if first.total_value == 0.0 {
        return 0.0;
    }
    let calendar_days = (last.date - first.date).num_days();
    if calendar_days <= 0 {
        return 0.0;
    }
    let growth = last.total_value / first.total_value;
    growth.powf(365.0 / calendar_days as f64) - 1.0
}

/// Matches each symbol's BUYs to the SELL that closes them out in full (the
/// only sell shape this system produces), and returns the realized P&L of
/// each such round trip in chronological order across all symbols.
fn round_trip_pnls(trades: &[TradeRecord]) -> Vec<f64> {
    let mut cost_basis: BTreeMap<String, f64> = BTreeMap::new();
    let mut pnls = Vec::new();
    for trade in trades {
        match trade.action {
            SignalAction::Buy => {
                *cost_basis.entry(trade.symbol.clone()).or_insert(0.0) +=
                    trade.shares as f64 * trade.price;
            }
            SignalAction::Sell => {
                let basis = cost_basis.remove(&trade.symbol).unwrap_or(0.0);
                let proceeds = trade.shares as f64 * trade.price;
                pnls.push(proceeds - basis);
            }
            SignalAction::Hold => {}
        }
    }
    pnls
}

fn compute_per_symbol(trades: &[TradeRecord]) -> BTreeMap<String, PerSymbolStats> {
    let mut cost_basis: BTreeMap<String, f64> = BTreeMap::new();
    let mut stats: BTreeMap<String, PerSymbolStats> = BTreeMap::new();
    for trade in trades {
        let entry = stats.entry(trade.symbol.clone()).or_insert(PerSymbolStats {
            trade_count: 0,
            realized_pnl: 0.0,
        });
        entry.trade_count += 1;
        match trade.action {
            SignalAction::Buy => {
                *cost_basis.entry(trade.symbol.clone()).or_insert(0.0) +=
                    trade.shares as f64 * trade.price;
            }
            SignalAction::Sell => {
                let basis = cost_basis.remove(&trade.symbol).unwrap_or(0.0);
                let proceeds = trade.shares as f64 * trade.price;
                entry.realized_pnl += proceeds - basis;
            }
            SignalAction::Hold => {}
        }
    }
    stats
}
