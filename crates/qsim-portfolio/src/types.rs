use std::collections::BTreeMap;

use tracing::warn;

use crate::error::PortfolioError;

/// A single-symbol holding, weighted-average-cost accounting.
///
/// `shares` is never negative (no short selling). `average_cost` is the
/// volume-weighted average entry price of the current holding; it is only
/// meaningful while `shares > 0` and is reset to `0.0` once a sell brings
/// `shares` back to zero, per the full-exit sell semantics of [`Portfolio`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub shares: i64,
    pub average_cost: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self {
            shares: 0,
            average_cost: 0.0,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.average_cost)
    }
}

/// Cash plus a book of per-symbol [`Position`]s.
///
/// Invariants enforced by every mutator:
/// - `cash >= 0` always.
/// - `shares >= 0` for every position (no shorting).
/// - `total_value` sums in sorted-symbol order, fixing the floating-point
///   accumulation order so that repeated runs over the same inputs are
///   bit-identical.
#[derive(Clone, Debug, PartialEq)]
pub struct Portfolio {
    cash: f64,
    positions: BTreeMap<String, Position>,
}

impl Portfolio {
    pub fn new(starting_cash: f64) -> Self {
        assert!(starting_cash >= 0.0, "starting cash must be >= 0");
        Self {
            cash: starting_cash,
            positions: BTreeMap::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn shares_of(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).map_or(0, |p| p.shares)
    }

    /// Deterministic mark-to-market: cash plus the market value of every
    /// position, iterated in symbol-sorted order (`BTreeMap` already
    /// guarantees this), so the summation order never depends on insertion
    /// order or prior trade history.
    pub fn total_value(&self, prices: &BTreeMap<String, f64>) -> f64 {
        let mut total = self.cash;
        for (symbol, position) in &self.positions {
            if position.shares == 0 {
                continue;
            }
            match prices.get(symbol) {
                Some(price) => total += position.market_value(*price),
                None => {
                    warn!(symbol, "no price available for open position; marking at zero");
                }
            }
        }
        total
    }

    /// Buys `shares` at `price`, updating the weighted-average cost.
    /// Rejects if cash is insufficient (`shares * price > cash`).
    pub fn buy(&mut self, symbol: &str, shares: i64, price: f64) -> Result<(), PortfolioError> {
        if shares <= 0 {
            return Err(PortfolioError::InvalidOrderSize { shares });
        }
        if price <= 0.0 {
            return Err(PortfolioError::InvalidPrice { price });
        }
        let cost = shares as f64 * price;
        if cost > self.cash {
            return Err(PortfolioError::InsufficientFunds {
                required: cost,
                available: self.cash,
            });
        }
        self.cash -= cost;
        let position = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(Position::flat);
        let total_cost = position.average_cost * position.shares as f64 + cost;
        position.shares += shares;
        position.average_cost = total_cost / position.shares as f64;
        Ok(())
    }

    /// Sells the entire position in `symbol` at `price`. Partial exits are
    /// not supported: a sell always closes the position in full.
    pub fn sell(&mut self, symbol: &str, price: f64) -> Result<f64, PortfolioError> {
        if price <= 0.0 {
            return Err(PortfolioError::InvalidPrice { price });
        }
        let Some(position) = self.positions.get_mut(symbol) else {
            return Err(PortfolioError::NoPosition {
                symbol: symbol.to_string(),
            });
        };
        if position.shares == 0 {
            return Err(PortfolioError::NoPosition {
                symbol: symbol.to_string(),
            });
        }
        let proceeds = position.shares as f64 * price;
        self.cash += proceeds;
        position.shares = 0;
        position.average_cost = 0.0;
        Ok(proceeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    #[test]
    fn buy_updates_weighted_average_cost() {
        let mut p = Portfolio::new(10_000.0);
        p.buy("AAPL", 10, 100.0).unwrap();
        p.buy("AAPL", 10, 200.0).unwrap();
        let pos = p.position("AAPL").unwrap();
        assert_eq!(pos.shares, 20);
        assert_eq!(pos.average_cost, 150.0);
    }

    #[test]
    fn insufficient_funds_rejected() {
        let mut p = Portfolio::new(100.0);
        let err = p.buy("AAPL", 10, 100.0).unwrap_err();
        assert_eq!(
            err,
            PortfolioError::InsufficientFunds {
                required: 1_000.0,
                available: 100.0
            }
        );
    }

    #[test]
    fn sell_closes_position_fully_and_resets_cost() {
        let mut p = Portfolio::new(10_000.0);
        p.buy("AAPL", 10, 100.0).unwrap();
        let proceeds = p.sell("AAPL", 120.0).unwrap();
        assert_eq!(proceeds, 1_200.0);
        let pos = p.position("AAPL").unwrap();
        assert_eq!(pos.shares, 0);
        assert_eq!(pos.average_cost, 0.0);
    }

    #[test]
    fn total_value_sums_in_symbol_sorted_order() {
        let mut p = Portfolio::new(1_000.0);
        p.buy("MSFT", 1, 10.0).unwrap();
        p.buy("AAPL", 1, 10.0).unwrap();
        let total = p.total_value(&prices(&[("AAPL", 20.0), ("MSFT", 30.0)]));
        assert_eq!(total, 1_000.0 - 20.0 + 20.0 + 30.0);
    }

    #[test]
    fn cash_never_goes_negative() {
        let mut p = Portfolio::new(50.0);
        assert!(p.buy("AAPL", 1, 100.0).is_err());
        assert_eq!(p.cash(), 50.0);
    }
}
