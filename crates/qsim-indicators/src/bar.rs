use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of OHLCV history for a single symbol.
///
/// `high >= open, close, low` and `low <= open, close, high` are assumed by
/// callers but not enforced here; a `PriceStore` is responsible for
/// rejecting malformed bars before they reach the engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}
