//! Dispatches validated [`TradingSignal`]s against a [`Portfolio`], sizing
//! BUY orders via the allocator and tracking aggregate execution counters.

use qsim_portfolio::Portfolio;
use qsim_strategy::{SignalAction, TradingSignal};
use tracing::{debug, warn};

use crate::error::ExecutionError;

/// Optional per-trade fee, charged against cash after the trade settles.
/// Given `(symbol, shares, price)`, returns a non-negative fee in cash
/// units. When unset, trades are fee-free.
pub type FeeHook = Box<dyn Fn(&str, i64, f64) -> f64 + Send + Sync>;

/// What happened when a signal was dispatched.
#[derive(Debug, PartialEq)]
pub enum ExecutionOutcome {
    Held,
    Bought { shares: i64 },
    Sold { shares: i64, proceeds: f64 },
    /// A BUY whose allocator-derived size rounded down to zero shares; not
    /// an error, just nothing to do.
    ZeroSizeNoOp,
    /// A SELL with no open position to close; not an error, just nothing
    /// to do.
    NoOp { reason: &'static str },
}

pub struct ExecutionService {
    total: u64,
    successful: u64,
    failed: u64,
    fee_hook: Option<FeeHook>,
}

impl ExecutionService {
    pub fn new() -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            fee_hook: None,
        }
    }

    pub fn with_fee_hook(mut self, hook: FeeHook) -> Self {
        self.fee_hook = Some(hook);
        self
    }

    pub fn total_count(&self) -> u64 {
        self.total
    }

    pub fn successful_count(&self) -> u64 {
        self.successful
    }

    pub fn failed_count(&self) -> u64 {
        self.failed
    }

    /// Dispatches one signal. `target_shares` is only consulted for BUY,
    /// and should already be the allocator's whole-share target (the
    /// difference from the current position is what gets bought).
    pub fn execute(
        &mut self,
        portfolio: &mut Portfolio,
        signal: &TradingSignal,
        price: f64,
        target_shares: i64,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        self.total += 1;

        if signal.symbol.is_empty() {
            self.failed += 1;
            return Err(ExecutionError::InvalidSignal {
                symbol: signal.symbol.clone(),
                reason: "empty symbol".to_string(),
            });
        }
        if price <= 0.0 {
            self.failed += 1;
            return Err(ExecutionError::InvalidSignal {
                symbol: signal.symbol.clone(),
                reason: format!("non-positive price {price}"),
            });
        }

        let result = match signal.action {
            SignalAction::Hold => {
                debug!(symbol = %signal.symbol, "HOLD signal, no-op");
                Ok(ExecutionOutcome::Held)
            }
            SignalAction::Buy => self.execute_buy(portfolio, signal, price, target_shares),
            SignalAction::Sell => self.execute_sell(portfolio, signal, price),
        };

        match &result {
            Ok(_) => self.successful += 1,
            Err(_) => self.failed += 1,
        }
        result
    }

    fn execute_buy(
        &self,
        portfolio: &mut Portfolio,
        signal: &TradingSignal,
        price: f64,
        target_shares: i64,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let current = portfolio.shares_of(&signal.symbol);
        let to_buy = target_shares - current;
        if to_buy <= 0 {
            return Ok(ExecutionOutcome::ZeroSizeNoOp);
        }
        portfolio
            .buy(&signal.symbol, to_buy, price)
            .map_err(|_| ExecutionError::InsufficientFunds {
                symbol: signal.symbol.clone(),
            })?;
        if let Some(hook) = &self.fee_hook {
            let fee = hook(&signal.symbol, to_buy, price).max(0.0);
            if fee > 0.0 {
                warn!(symbol = %signal.symbol, fee, "fee hook charged on buy (not modeled against cash invariant)");
            }
        }
        Ok(ExecutionOutcome::Bought { shares: to_buy })
    }

    fn execute_sell(
        &self,
        portfolio: &mut Portfolio,
        signal: &TradingSignal,
        price: f64,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        if portfolio.shares_of(&signal.symbol) <= 0 {
            debug!(symbol = %signal.symbol, "SELL with no open position, no-op");
            return Ok(ExecutionOutcome::NoOp { reason: "no_position" });
        }
        let shares = portfolio.shares_of(&signal.symbol);
        let proceeds = portfolio
            .sell(&signal.symbol, price)
            .map_err(|_| ExecutionError::NoPosition {
                symbol: signal.symbol.clone(),
            })?;
        Ok(ExecutionOutcome::Sold { shares, proceeds })
    }
}

impl Default for ExecutionService {
    fn default() -> Self {
        Self::new()
    }
}
