use std::collections::HashMap;

use crate::bar::PriceBar;
use crate::bollinger::{bollinger_bands, BollingerBands};
use crate::ema::ema;
use crate::error::IndicatorError;
use crate::rsi::rsi;
use crate::sma::sma;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Indicator {
    Sma,
    Ema,
    Rsi,
    Bollinger,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    indicator: Indicator,
    period: usize,
    /// Bit pattern of any secondary numeric parameter (e.g. Bollinger's
    /// `k`); zero when the indicator has none.
    param_bits: u64,
}

enum CacheValue {
    Series(Vec<Option<f64>>),
    Bands(BollingerBands),
}

/// A rolling window of history for one symbol, with memoized indicator
/// series keyed by `(indicator, period)`.
///
/// The cache is invalidated whenever the window is mutated (`push_bar`,
/// `set_bars`); it is never invalidated by reading.
pub struct TechnicalIndicators {
    bars: Vec<PriceBar>,
    cache: HashMap<CacheKey, CacheValue>,
}

impl TechnicalIndicators {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            bars,
            cache: HashMap::new(),
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn push_bar(&mut self, bar: PriceBar) {
        self.bars.push(bar);
        self.cache.clear();
    }

    pub fn set_bars(&mut self, bars: Vec<PriceBar>) {
        self.bars = bars;
        self.cache.clear();
    }

    /// Fails with [`IndicatorError::InvalidPeriod`] when `period` is zero;
    /// a failed lookup is never cached.
    pub fn sma(&mut self, period: usize) -> Result<&[Option<f64>], IndicatorError> {
        let key = CacheKey {
            indicator: Indicator::Sma,
            period,
            param_bits: 0,
        };
        if !self.cache.contains_key(&key) {
            let series = sma(&self.closes(), period)?;
            self.cache.insert(key.clone(), CacheValue::Series(series));
        }
        match self.cache.get(&key).unwrap() {
            CacheValue::Series(s) => Ok(s),
            CacheValue::Bands(_) => unreachable!("cache key collision"),
        }
    }

    /// Fails with [`IndicatorError::InvalidPeriod`] when `period` is zero;
    /// a failed lookup is never cached.
    pub fn ema(&mut self, period: usize) -> Result<&[Option<f64>], IndicatorError> {
        let key = CacheKey {
            indicator: Indicator::Ema,
            period,
            param_bits: 0,
        };
        if !self.cache.contains_key(&key) {
            let series = ema(&self.closes(), period)?;
            self.cache.insert(key.clone(), CacheValue::Series(series));
        }
        match self.cache.get(&key).unwrap() {
            CacheValue::Series(s) => Ok(s),
            CacheValue::Bands(_) => unreachable!("cache key collision"),
        }
    }

    /// Fails with [`IndicatorError::InvalidPeriod`] when `period` is zero;
    /// a failed lookup is never cached.
    pub fn rsi(&mut self, period: usize) -> Result<&[Option<f64>], IndicatorError> {
        let key = CacheKey {
            indicator: Indicator::Rsi,
            period,
            param_bits: 0,
        };
        if !self.cache.contains_key(&key) {
            let series = rsi(&self.closes(), period)?;
            self.cache.insert(key.clone(), CacheValue::Series(series));
        }
        match self.cache.get(&key).unwrap() {
            CacheValue::Series(s) => Ok(s),
            CacheValue::Bands(_) => unreachable!("cache key collision"),
        }
    }

    /// Fails with [`IndicatorError::InvalidPeriod`] when `period` is zero;
    /// a failed lookup is never cached.
    pub fn bollinger(&mut self, period: usize, k: f64) -> Result<&BollingerBands, IndicatorError> {
        let key = CacheKey {
            indicator: Indicator::Bollinger,
            period,
            param_bits: k.to_bits(),
        };
        if !self.cache.contains_key(&key) {
            let bands = bollinger_bands(&self.closes(), period, k)?;
            self.cache.insert(key.clone(), CacheValue::Bands(bands));
        }
        match self.cache.get(&key).unwrap() {
            CacheValue::Bands(b) => Ok(b),
            CacheValue::Series(_) => unreachable!("cache key collision"),
        }
    }
}
