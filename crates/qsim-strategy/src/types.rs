use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A directive produced by a [`Strategy`] for one symbol on one bar.
///
/// Strategies never size orders themselves: `BUY`/`SELL` carry no share
/// count, only a reason. Sizing is the allocator's responsibility. `price`
/// and `date` are the bar the strategy evaluated against, not necessarily
/// the eventual fill price; `confidence` is clamped to `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub action: SignalAction,
    pub price: f64,
    pub date: NaiveDate,
    pub reason: String,
    pub confidence: f64,
}

impl TradingSignal {
    pub fn hold<S: Into<String>>(symbol: S, date: NaiveDate, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            action: SignalAction::Hold,
            price,
            date,
            reason: "no_signal".to_string(),
            confidence: 1.0,
        }
    }

    pub fn buy<S: Into<String>, R: Into<String>>(symbol: S, date: NaiveDate, price: f64, reason: R) -> Self {
        Self {
            symbol: symbol.into(),
            action: SignalAction::Buy,
            price,
            date,
            reason: reason.into(),
            confidence: 1.0,
        }
    }

    pub fn sell<S: Into<String>, R: Into<String>>(symbol: S, date: NaiveDate, price: f64, reason: R) -> Self {
        Self {
            symbol: symbol.into(),
            action: SignalAction::Sell,
            price,
            date,
            reason: reason.into(),
            confidence: 1.0,
        }
    }

    /// Overrides the default confidence of `1.0`, clamping into `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Hold,
    Buy,
    Sell,
}

/// Strategy-level configuration shared by every [`Strategy`] implementation.
///
/// `max_position_size` is a fraction of `(0, 1]`: the caller clamps the
/// allocator's target weight for a symbol to this value before sizing a BUY,
/// so it caps how much of the portfolio any single symbol can ever hold
/// regardless of what the allocator would otherwise assign it.
///
/// `enable_risk_management` gates the stop-loss/take-profit override: when
/// set, a strategy must check the current position's unrealized return
/// against `stop_loss_pct`/`take_profit_pct` before running its own signal
/// logic, and emit a forced SELL with reason `"risk_exit"` if either is
/// breached.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyConfig {
    pub max_position_size: f64,
    pub enable_risk_management: bool,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            max_position_size: 1.0,
            enable_risk_management: false,
            stop_loss_pct: 0.1,
            take_profit_pct: 0.2,
        }
    }
}

/// Evaluates one symbol on the current bar and returns a [`TradingSignal`].
///
/// `window` holds the close history up to and including the current bar for
/// `symbol` only; strategies never see other symbols' history or prices.
/// `average_cost`/`shares_held` describe the caller's current position in
/// `symbol`, used by the risk-management override; strategies must not
/// mutate portfolio state themselves.
pub trait Strategy {
    fn evaluate(
        &mut self,
        symbol: &str,
        window: &mut qsim_indicators::TechnicalIndicators,
        shares_held: i64,
        average_cost: f64,
        current_price: f64,
    ) -> TradingSignal;

    fn config(&self) -> &StrategyConfig;

    /// Checks the stop-loss/take-profit override common to every strategy.
    /// Returns `Some` when the position should be forced flat.
    fn risk_exit(
        &self,
        symbol: &str,
        date: NaiveDate,
        shares_held: i64,
        average_cost: f64,
        current_price: f64,
    ) -> Option<TradingSignal> {
        let config = self.config();
        if !config.enable_risk_management || shares_held <= 0 || average_cost <= 0.0 {
            return None;
        }
        let ret = (current_price - average_cost) / average_cost;
        if ret <= -config.stop_loss_pct || ret >= config.take_profit_pct {
            return Some(TradingSignal::sell(symbol, date, current_price, "risk_exit"));
        }
        None
    }
}
