//! qsim-backtest
//!
//! Historical backtest replay engine: given a symbol universe, a date range,
//! a strategy, and an allocation policy, replays the unified trading-day
//! timeline bar-by-bar and produces a full performance report.
//!
//! Pipeline: PRICE STORE -> DATA PROCESSOR -> STRATEGY -> ALLOCATOR ->
//! EXECUTION -> PORTFOLIO -> RESULT CALCULATOR
//!
//! - Deterministic replay (same bars + config => identical results)
//! - No lookahead: a symbol's window only advances on days it has a bar
//! - Weighted-average-cost accounting via `qsim_portfolio`
//! - Cooperative cancellation, polled at day boundaries

mod config;
mod data_processor;
mod engine;
mod error;
mod execution;
mod price_store;
mod progress;
mod result;

pub use config::{BacktestConfig, StrategySelection};
pub use data_processor::DataProcessor;
pub use engine::{BacktestEngine, CancellationToken};
pub use error::{BacktestError, ConfigError, DataError, ExecutionError};
pub use execution::{ExecutionOutcome, ExecutionService, FeeHook};
pub use price_store::{CsvPriceStore, InMemoryPriceStore, PriceStore};
pub use progress::{ProgressEvent, ProgressService};
pub use result::{BacktestResult, EquitySample, PerSymbolStats, PerformanceMetrics, ResultCalculator, RunStatus, TradeRecord};
