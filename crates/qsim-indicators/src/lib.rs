//! Technical indicator library used by trading strategies.
//!
//! Indicator series are computed over a symbol's full close history. Every
//! series is `Vec<Option<f64>>`: `None` marks the leading bars where an
//! indicator is mathematically undefined (not enough history yet), rather
//! than silently filling in a sentinel value.

mod bar;
mod bollinger;
mod crossover;
mod ema;
mod error;
mod indicators;
mod rsi;
mod rsi_signal;
mod sma;

pub use bar::PriceBar;
pub use bollinger::{bollinger_bands, BollingerBands};
pub use crossover::{crossovers, Crossover};
pub use ema::ema;
pub use error::IndicatorError;
pub use indicators::TechnicalIndicators;
pub use rsi::rsi;
pub use rsi_signal::{rsi_boundary_crossings, RsiBoundaryCross};
pub use sma::{rolling_stdev, sma};
