//! Trading strategies: pure functions from a symbol's historical window and
//! current position to a [`TradingSignal`]. Strategies never size orders or
//! touch cash; that is the allocator's and portfolio's job.

mod strategies;
mod types;

pub use strategies::{MovingAverageCrossover, RsiStrategy};
pub use types::{SignalAction, Strategy, StrategyConfig, TradingSignal};
