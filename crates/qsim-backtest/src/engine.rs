//! Orchestrates a full replay over a [`BacktestConfig`]: loads history from a
//! [`PriceStore`], builds the unified trading-day timeline, and for each day
//! evaluates every symbol's strategy in symbol order, sizes and executes the
//! resulting orders through the allocator, and samples the equity curve.
//!
//! State machine: `Created -> Validated -> Initialized -> Running ->
//! Finalized`, with `Failed`/`Cancelled` reachable from `Running`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use qsim_portfolio::Portfolio;
use qsim_strategy::{
    MovingAverageCrossover, RsiStrategy, SignalAction, Strategy, StrategyConfig, TradingSignal,
};
use tracing::{info, warn};

use crate::config::{BacktestConfig, StrategySelection};
use crate::data_processor::DataProcessor;
use crate::error::{BacktestError, DataError};
use crate::execution::{ExecutionOutcome, ExecutionService};
use crate::price_store::PriceStore;
use crate::progress::ProgressService;
use crate::result::{BacktestResult, EquitySample, ResultCalculator, RunStatus, TradeRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EngineState {
    Created,
    Validated,
    Initialized,
    Running,
    Finalized,
    Failed,
    Cancelled,
}

/// Cooperative cancellation flag, polled once per day at the top of the
/// replay loop. Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The strategy's own lookback parameter, floored at [`data_processor::MIN_BARS_FLOOR`]
/// regardless of how short the strategy's own window is.
fn min_bars_required(selection: &StrategySelection) -> usize {
    let strategy_lookback = match selection {
        StrategySelection::MovingAverageCrossover { long_period, .. } => *long_period,
        StrategySelection::Rsi { period, .. } => *period,
    };
    strategy_lookback.max(crate::data_processor::MIN_BARS_FLOOR)
}

fn build_strategy(selection: &StrategySelection, config: StrategyConfig) -> Box<dyn Strategy> {
    match selection {
        StrategySelection::MovingAverageCrossover {
            short_period,
            long_period,
        } => Box::new(MovingAverageCrossover::new(*short_period, *long_period, config)),
        StrategySelection::Rsi {
            period,
            oversold,
            overbought,
        } => Box::new(RsiStrategy::new(*period, *oversold, *overbought, config)),
    }
}

pub struct BacktestEngine {
    config: BacktestConfig,
    state: EngineState,
    progress: ProgressService,
    cancellation: CancellationToken,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            state: EngineState::Created,
            progress: ProgressService::default(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressService) -> Self {
        self.progress = progress;
        self
    }

    /// A handle that can be cloned out and used to request cancellation from
    /// another thread while `run` is in progress.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    fn validate(&mut self) -> Result<(), BacktestError> {
        if self.config.symbols.is_empty() {
            self.state = EngineState::Failed;
            return Err(BacktestError::ConfigurationError {
                message: "no symbols configured".to_string(),
            });
        }
        if self.config.start_date > self.config.end_date {
            self.state = EngineState::Failed;
            return Err(BacktestError::Data(DataError::InvalidDateRange));
        }
        self.state = EngineState::Validated;
        Ok(())
    }

    /// Runs the full replay against `store`, consuming the engine. Always
    /// returns a well-formed result: a fatal error produces `status =
    /// Failed` with `error_message` populated, rather than propagating out
    /// of the function.
    pub fn run(self, store: &dyn PriceStore) -> BacktestResult {
        match self.try_run(store) {
            Ok(result) => result,
            Err(err) => ResultCalculator::new().failed(err.to_string()),
        }
    }

    fn try_run(mut self, store: &dyn PriceStore) -> Result<BacktestResult, BacktestError> {
        self.validate()?;
        self.state = EngineState::Initialized;

        let min_bars_required = min_bars_required(&self.config.strategy);
        let data = DataProcessor::load_historical_data(
            store,
            &self.config.symbols,
            self.config.start_date,
            self.config.end_date,
            min_bars_required,
        )?;
        let timeline = DataProcessor::create_unified_timeline(&data);
        let indices = DataProcessor::create_date_indices(&data);

        let mut windows = BTreeMap::new();
        let mut strategies: BTreeMap<String, Box<dyn Strategy>> = data
            .keys()
            .map(|symbol| {
                (
                    symbol.clone(),
                    build_strategy(&self.config.strategy, self.config.strategy_config.clone()),
                )
            })
            .collect();

        let mut portfolio = Portfolio::new(self.config.starting_capital);
        let mut execution = ExecutionService::new();
        let mut equity_curve: Vec<EquitySample> = Vec::new();
        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut days_since_rebalance = self.config.allocation.rebalance_frequency_days;

        self.state = EngineState::Running;
        info!(symbols = data.len(), days = timeline.len(), "starting replay");

        let mut cancelled = false;
        for (day_index, &date) in timeline.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                cancelled = true;
                break;
            }

            let updated = DataProcessor::update_historical_windows(&mut windows, &data, &indices, date);

            let current_prices: BTreeMap<String, f64> = windows
                .iter()
                .filter_map(|(symbol, window)| window.bars().last().map(|bar| (symbol.clone(), bar.close)))
                .collect();
            let closes: BTreeMap<String, Vec<f64>> = windows
                .iter()
                .map(|(symbol, window)| (symbol.clone(), window.closes()))
                .collect();

            let universe: Vec<String> = windows.keys().cloned().collect();
            let target_weights = match self.config.allocation.target_weights(&universe, &closes) {
                Ok(weights) => weights,
                Err(err) => {
                    warn!(date = %date, error = %err, "allocator could not produce target weights today");
                    BTreeMap::new()
                }
            };

            let total_value = portfolio.total_value(&current_prices);
            let current_weights: BTreeMap<String, f64> = if total_value > 0.0 {
                portfolio
                    .positions()
                    .iter()
                    .filter(|(_, p)| p.shares != 0)
                    .filter_map(|(symbol, p)| {
                        current_prices
                            .get(symbol)
                            .map(|price| (symbol.clone(), p.market_value(*price) / total_value))
                    })
                    .collect()
            } else {
                BTreeMap::new()
            };
            let rebalance_today =
                self.config
                    .allocation
                    .should_rebalance(&current_weights, &target_weights, days_since_rebalance);
            days_since_rebalance = if rebalance_today { 0 } else { days_since_rebalance + 1 };

            for symbol in &self.config.symbols {
                if !updated.contains(symbol) {
                    continue;
                }
                let Some(window) = windows.get_mut(symbol) else {
                    continue;
                };
                let Some(strategy) = strategies.get_mut(symbol) else {
                    continue;
                };
                let shares_held = portfolio.shares_of(symbol);
                let average_cost = portfolio.position(symbol).map_or(0.0, |p| p.average_cost);
                let Some(price) = current_prices.get(symbol).copied() else {
                    continue;
                };

                let signal = strategy.evaluate(symbol, window, shares_held, average_cost, price);
                let target_shares = match signal.action {
                    SignalAction::Buy => {
                        let weight = target_weights
                            .get(symbol)
                            .copied()
                            .unwrap_or(0.0)
                            .min(strategy.config().max_position_size);
                        self.config
                            .allocation
                            .position_size(weight, total_value.max(portfolio.cash()), price, shares_held)
                    }
                    SignalAction::Hold | SignalAction::Sell => 0,
                };

                let outcome = execution.execute(&mut portfolio, &signal, price, target_shares);
                match outcome {
                    Ok(ExecutionOutcome::Bought { shares }) => trades.push(TradeRecord {
                        date,
                        symbol: symbol.clone(),
                        action: SignalAction::Buy,
                        shares,
                        price,
                        reason: signal.reason.clone(),
                    }),
                    Ok(ExecutionOutcome::Sold { shares, .. }) => trades.push(TradeRecord {
                        date,
                        symbol: symbol.clone(),
                        action: SignalAction::Sell,
                        shares,
                        price,
                        reason: signal.reason.clone(),
                    }),
                    Ok(ExecutionOutcome::Held)
                    | Ok(ExecutionOutcome::ZeroSizeNoOp)
                    | Ok(ExecutionOutcome::NoOp { .. }) => {}
                    Err(err) => {
                        warn!(symbol = %symbol, error = %err, "order execution failed");
                    }
                }
            }

            // A sell is always a full exit, so a rebalance can only ever grow
            // an existing position toward its target weight, never trim one;
            // top-ups apply only to symbols already held going into today.
            if rebalance_today {
                for symbol in &universe {
                    if !updated.contains(symbol) {
                        continue;
                    }
                    let shares_held = portfolio.shares_of(symbol);
                    if shares_held <= 0 {
                        continue;
                    }
                    let Some(price) = current_prices.get(symbol).copied() else {
                        continue;
                    };
                    let max_position_size = strategies
                        .get(symbol)
                        .map_or(1.0, |strategy| strategy.config().max_position_size);
                    let weight = target_weights
                        .get(symbol)
                        .copied()
                        .unwrap_or(0.0)
                        .min(max_position_size);
                    let target_shares =
                        self.config.allocation.position_size(weight, total_value, price, shares_held);
                    if target_shares <= shares_held {
                        continue;
                    }
                    let signal = TradingSignal::buy(symbol.clone(), date, price, "rebalance_topup");
                    if let Ok(ExecutionOutcome::Bought { shares }) =
                        execution.execute(&mut portfolio, &signal, price, target_shares)
                    {
                        trades.push(TradeRecord {
                            date,
                            symbol: symbol.clone(),
                            action: SignalAction::Buy,
                            shares,
                            price,
                            reason: signal.reason.clone(),
                        });
                    }
                }
            }

            let total_value = portfolio.total_value(&current_prices);
            equity_curve.push(EquitySample { date, total_value });
            let representative_price = self
                .config
                .symbols
                .iter()
                .find_map(|symbol| current_prices.get(symbol).copied())
                .unwrap_or(0.0);
            self.progress
                .report(day_index, timeline.len(), date, total_value, representative_price);
        }

        self.state = if cancelled { EngineState::Cancelled } else { EngineState::Finalized };
        let status = if cancelled { RunStatus::Cancelled } else { RunStatus::Completed };
        info!(
            trades = trades.len(),
            total_count = execution.total_count(),
            failed_count = execution.failed_count(),
            "replay finished"
        );
        Ok(ResultCalculator::new().compute(status, &equity_curve, &trades))
    }
}
