//! Loads per-symbol history from a [`PriceStore`], builds the unified
//! trading-day timeline the engine replays over, and maintains each symbol's
//! rolling [`TechnicalIndicators`] window as the replay advances.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use qsim_indicators::{PriceBar, TechnicalIndicators};
use tracing::warn;

use crate::error::DataError;
use crate::price_store::PriceStore;

/// Lookback floor applied regardless of strategy parameters.
pub const MIN_BARS_FLOOR: usize = 60;

pub struct DataProcessor;

impl DataProcessor {
    /// Loads `[start, end]` history for every requested symbol.
    ///
    /// A symbol absent from the store, or with zero bars in range, is
    /// excluded and logged at warning level rather than failing the whole
    /// load. A symbol with *some* bars in range but fewer than
    /// `min_bars_required` (the strategy's lookback requirement) is also
    /// excluded, but its exclusion reason is remembered: if every symbol
    /// ends up excluded, the load fails with the most recently recorded
    /// reason rather than a bare "no data" error, so an insufficient-history
    /// misconfiguration is diagnosable from the result.
    pub fn load_historical_data(
        store: &dyn PriceStore,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        min_bars_required: usize,
    ) -> Result<BTreeMap<String, Vec<PriceBar>>, DataError> {
        if start > end {
            return Err(DataError::InvalidDateRange);
        }
        let mut data = BTreeMap::new();
        let mut last_exclusion: Option<DataError> = None;
        for symbol in symbols {
            if !store.symbol_exists(symbol) {
                warn!(symbol, "symbol not present in price store; excluding");
                last_exclusion = Some(DataError::SymbolNotFound { symbol: symbol.clone() });
                continue;
            }
            let bars = store.get_bars(symbol, start, end)?;
            if bars.is_empty() {
                warn!(symbol, "no bars in requested range; excluding");
                last_exclusion = Some(DataError::SymbolNotFound { symbol: symbol.clone() });
                continue;
            }
            if bars.len() < min_bars_required {
                warn!(
                    symbol,
                    have = bars.len(),
                    need = min_bars_required,
                    "fewer bars than the strategy's lookback requires; excluding"
                );
                last_exclusion = Some(DataError::InsufficientHistory {
                    symbol: symbol.clone(),
                    have: bars.len(),
                    need: min_bars_required,
                });
                continue;
            }
            data.insert(symbol.clone(), bars);
        }

        if data.is_empty() {
            return Err(last_exclusion.unwrap_or(DataError::InvalidDateRange));
        }

        if let (Some(min), Some(max)) = (
            data.values().map(Vec::len).min(),
            data.values().map(Vec::len).max(),
        ) {
            if max > 0 && (max - min) as f64 / max as f64 > 0.2 {
                warn!(
                    min_bars = min,
                    max_bars = max,
                    "bar counts across symbols differ by more than 20%"
                );
            }
        }

        Ok(data)
    }

    /// The sorted union of every symbol's bar dates: the sequence of days
    /// the engine advances over.
    pub fn create_unified_timeline(data: &BTreeMap<String, Vec<PriceBar>>) -> Vec<NaiveDate> {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for bars in data.values() {
            dates.extend(bars.iter().map(|b| b.date));
        }
        dates.into_iter().collect()
    }

    /// Per-symbol `date -> index` lookup into that symbol's bar vec, so the
    /// per-day loop can find "does this symbol have a bar today" in O(log n)
    /// without scanning.
    pub fn create_date_indices(
        data: &BTreeMap<String, Vec<PriceBar>>,
    ) -> BTreeMap<String, BTreeMap<NaiveDate, usize>> {
        data.iter()
            .map(|(symbol, bars)| {
                let index = bars
                    .iter()
                    .enumerate()
                    .map(|(i, bar)| (bar.date, i))
                    .collect();
                (symbol.clone(), index)
            })
            .collect()
    }

    /// Appends today's bar (if the symbol has one) to that symbol's rolling
    /// window. Symbols without a bar today are left untouched: their window
    /// simply does not advance, and they are excluded from today's strategy
    /// evaluation and rebalance.
    pub fn update_historical_windows(
        windows: &mut BTreeMap<String, TechnicalIndicators>,
        data: &BTreeMap<String, Vec<PriceBar>>,
        indices: &BTreeMap<String, BTreeMap<NaiveDate, usize>>,
        date: NaiveDate,
    ) -> BTreeSet<String> {
        let mut updated = BTreeSet::new();
        for (symbol, bars) in data {
            let Some(idx) = indices.get(symbol).and_then(|m| m.get(&date)) else {
                continue;
            };
            let window = windows
                .entry(symbol.clone())
                .or_insert_with(|| TechnicalIndicators::new(Vec::new()));
            window.push_bar(bars[*idx]);
            updated.insert(symbol.clone());
        }
        updated
    }
}
