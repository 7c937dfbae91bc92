//! The `PriceStore` interface and two concrete adapters. The persistence
//! layer proper (a durable daily-bar store) is a collaborator this crate
//! consumes through this trait; it is not implemented here.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use qsim_indicators::PriceBar;

use crate::error::DataError;

/// Read-only access to daily OHLCV history, keyed by symbol.
pub trait PriceStore {
    /// Returns every bar for `symbol` within `[start, end]`, sorted by date
    /// ascending. Returns an empty vec (not an error) when the symbol is
    /// known but has no bars in range.
    fn get_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError>;

    fn list_symbols(&self) -> Vec<String>;

    fn symbol_exists(&self, symbol: &str) -> bool {
        self.list_symbols().iter().any(|s| s == symbol)
    }
}

/// An in-memory `PriceStore`, the default test double and a convenience for
/// embedders who already hold bars in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPriceStore {
    bars: BTreeMap<String, Vec<PriceBar>>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        self.bars.insert(symbol.into(), bars);
        self
    }
}

impl PriceStore for InMemoryPriceStore {
    fn get_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let Some(bars) = self.bars.get(symbol) else {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        };
        Ok(bars
            .iter()
            .copied()
            .filter(|b| b.date >= start && b.date <= end)
            .collect())
    }

    fn list_symbols(&self) -> Vec<String> {
        self.bars.keys().cloned().collect()
    }
}

/// A deterministic, hand-rolled CSV reader: one file per symbol, columns
/// `date,open,high,low,close,volume`, no quoting support. This is a
/// convenience adapter, not a replacement for a real persistence layer.
#[derive(Clone, Debug, Default)]
pub struct CsvPriceStore {
    inner: InMemoryPriceStore,
}

impl CsvPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file(&mut self, symbol: impl Into<String>, path: impl AsRef<Path>) -> Result<(), DataError> {
        let symbol = symbol.into();
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| DataError::ParsingFailed {
            message: format!("reading '{}': {e}", path.as_ref().display()),
        })?;
        let bars = parse_csv_bars(&contents)?;
        self.inner = std::mem::take(&mut self.inner).with_symbol(symbol, bars);
        Ok(())
    }
}

impl PriceStore for CsvPriceStore {
    fn get_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        self.inner.get_bars(symbol, start, end)
    }

    fn list_symbols(&self) -> Vec<String> {
        self.inner.list_symbols()
    }
}

fn parse_csv_bars(contents: &str) -> Result<Vec<PriceBar>, DataError> {
    let mut lines = contents.lines();
    let header = lines.next().ok_or_else(|| DataError::ParsingFailed {
        message: "empty CSV input".to_string(),
    })?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let index_of = |name: &str| -> Result<usize, DataError> {
        columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataError::ParsingFailed {
                message: format!("missing column '{name}' in CSV header"),
            })
    };
    let date_idx = index_of("date")?;
    let open_idx = index_of("open")?;
    let high_idx = index_of("high")?;
    let low_idx = index_of("low")?;
    let close_idx = index_of("close")?;
    let volume_idx = index_of("volume")?;

    let mut bars = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let parse_err = |message: String| DataError::ParsingFailed {
            message: format!("row {}: {message}", line_no + 2),
        };
        let get = |idx: usize| -> Result<&str, DataError> {
            fields
                .get(idx)
                .copied()
                .ok_or_else(|| parse_err("column out of range".to_string()))
        };
        let date = NaiveDate::parse_from_str(get(date_idx)?, "%Y-%m-%d")
            .map_err(|e| parse_err(format!("bad date: {e}")))?;
        let parse_f64 = |s: &str| s.parse::<f64>().map_err(|e| parse_err(format!("bad number '{s}': {e}")));
        let parse_u64 = |s: &str| s.parse::<u64>().map_err(|e| parse_err(format!("bad volume '{s}': {e}")));
        bars.push(PriceBar::new(
            date,
            parse_f64(get(open_idx)?)?,
            parse_f64(get(high_idx)?)?,
            parse_f64(get(low_idx)?)?,
            parse_f64(get(close_idx)?)?,
            parse_u64(get(volume_idx)?)?,
        ));
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}
