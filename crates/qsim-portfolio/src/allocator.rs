//! qsim-portfolio: allocator
//!
//! Converts a universe of tradeable symbols into target portfolio weights
//! under one of several allocation strategies, then turns a target weight
//! into a whole-share order size.
//!
//! Pure, no IO: callers supply whatever historical closes or custom weights
//! a strategy needs; the allocator never reads a `PriceStore` itself.

use std::collections::BTreeMap;

use tracing::warn;

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum AllocationError {
    EmptyUniverse,
    UnknownCustomSymbol { symbol: String },
    AllWeightsExcluded,
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUniverse => write!(f, "allocation universe is empty"),
            Self::UnknownCustomSymbol { symbol } => {
                write!(f, "custom weight supplied for unknown symbol '{symbol}'")
            }
            Self::AllWeightsExcluded => {
                write!(f, "every candidate was excluded by the allocation strategy")
            }
        }
    }
}

impl std::error::Error for AllocationError {}

// ─── Strategy ────────────────────────────────────────────────────────────────

/// The weighting scheme used to turn a symbol universe into target weights.
#[derive(Clone, Debug, PartialEq)]
pub enum PortfolioAllocator {
    /// `1 / N` for every symbol in the universe.
    EqualWeight,
    /// `(1 / sigma_i) / sum(1 / sigma_j)` over a trailing window of daily
    /// returns. Symbols with fewer than 20 bars of history are excluded.
    VolatilityAdjusted,
    /// `return_i / sum(return_j)` over a trailing 63-bar lookback. Symbols
    /// with a non-positive lookback return are excluded.
    MomentumBased,
    /// Iterative equal-risk-contribution scaling.
    RiskParity,
    /// Caller-supplied raw weights, renormalized to sum to 1.
    Custom(BTreeMap<String, f64>),
}

const VOLATILITY_WINDOW: usize = 60;
const VOLATILITY_MIN_BARS: usize = 20;
const MOMENTUM_LOOKBACK: usize = 63;
const RISK_PARITY_MAX_ITERATIONS: usize = 50;
const RISK_PARITY_CONVERGENCE: f64 = 1e-4;

// ─── AllocationConfig ────────────────────────────────────────────────────────

/// Rebalancing and position-sizing policy paired with a [`PortfolioAllocator`].
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationConfig {
    pub strategy: PortfolioAllocator,
    pub cash_reserve_pct: f64,
    pub rebalance_frequency_days: i64,
    pub rebalance_drift_threshold: f64,
    pub min_position_weight: f64,
    pub max_position_weight: f64,
    /// Upper bound, as a fraction of total portfolio value, on how much a
    /// single rebalance may grow one position's market value by.
    pub max_position_increase_pct: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            strategy: PortfolioAllocator::EqualWeight,
            cash_reserve_pct: 0.0,
            rebalance_frequency_days: 30,
            rebalance_drift_threshold: 0.1,
            min_position_weight: 0.0,
            max_position_weight: 1.0,
            max_position_increase_pct: 1.0,
        }
    }
}

impl PortfolioAllocator {
    /// Computes raw target weights for `symbols`, before the min/max weight
    /// projection applied by [`AllocationConfig::target_weights`].
    ///
    /// `closes` maps each symbol to its full close history up to and
    /// including the current bar (oldest first).
    fn raw_weights(
        &self,
        symbols: &[String],
        closes: &BTreeMap<String, Vec<f64>>,
    ) -> Result<BTreeMap<String, f64>, AllocationError> {
        if symbols.is_empty() {
            return Err(AllocationError::EmptyUniverse);
        }
        match self {
            PortfolioAllocator::EqualWeight => {
                let w = 1.0 / symbols.len() as f64;
                Ok(symbols.iter().map(|s| (s.clone(), w)).collect())
            }
            PortfolioAllocator::VolatilityAdjusted => {
                let mut inv_vol = BTreeMap::new();
                for symbol in symbols {
                    let Some(series) = closes.get(symbol) else {
                        warn!(symbol, "no price history for volatility allocation; excluding");
                        continue;
                    };
                    if series.len() < VOLATILITY_MIN_BARS {
                        warn!(
                            symbol,
                            bars = series.len(),
                            "insufficient history for volatility allocation; excluding"
                        );
                        continue;
                    }
                    let window = tail(series, VOLATILITY_WINDOW);
                    let returns = daily_returns(window);
                    let sigma = stdev(&returns);
                    if sigma > 0.0 {
                        inv_vol.insert(symbol.clone(), 1.0 / sigma);
                    }
                }
                normalize(inv_vol)
            }
            PortfolioAllocator::MomentumBased => {
                let mut momentum = BTreeMap::new();
                for symbol in symbols {
                    let Some(series) = closes.get(symbol) else {
                        warn!(symbol, "no price history for momentum allocation; excluding");
                        continue;
                    };
                    if series.len() <= MOMENTUM_LOOKBACK {
                        continue;
                    }
                    let last = series[series.len() - 1];
                    let prior = series[series.len() - 1 - MOMENTUM_LOOKBACK];
                    if prior == 0.0 {
                        continue;
                    }
                    let ret = last / prior - 1.0;
                    if ret > 0.0 {
                        momentum.insert(symbol.clone(), ret);
                    }
                }
                normalize(momentum)
            }
            PortfolioAllocator::RiskParity => {
                let mut sigmas = BTreeMap::new();
                for symbol in symbols {
                    let Some(series) = closes.get(symbol) else {
                        continue;
                    };
                    if series.len() < VOLATILITY_MIN_BARS {
                        continue;
                    }
                    let window = tail(series, VOLATILITY_WINDOW);
                    let returns = daily_returns(window);
                    let sigma = stdev(&returns);
                    if sigma > 0.0 {
                        sigmas.insert(symbol.clone(), sigma);
                    }
                }
                if sigmas.is_empty() {
                    return Err(AllocationError::AllWeightsExcluded);
                }
                Ok(risk_parity_weights(&sigmas))
            }
            PortfolioAllocator::Custom(weights) => {
                for symbol in weights.keys() {
                    if !symbols.contains(symbol) {
                        return Err(AllocationError::UnknownCustomSymbol {
                            symbol: symbol.clone(),
                        });
                    }
                }
                normalize(weights.clone())
            }
        }
    }
}

impl AllocationConfig {
    /// Target weights after applying the strategy, the cash reserve, and
    /// the min/max position-weight box constraint (clamp, then
    /// renormalize, repeated to convergence).
    pub fn target_weights(
        &self,
        symbols: &[String],
        closes: &BTreeMap<String, Vec<f64>>,
    ) -> Result<BTreeMap<String, f64>, AllocationError> {
        let mut weights = self.strategy.raw_weights(symbols, closes)?;
        if weights.is_empty() {
            return Err(AllocationError::AllWeightsExcluded);
        }
        let investable = (1.0 - self.cash_reserve_pct).max(0.0);
        for w in weights.values_mut() {
            *w *= investable;
        }
        Ok(project_to_bounds(
            weights,
            self.min_position_weight,
            self.max_position_weight,
        ))
    }

    /// Whole-share target position size for `weight` of `total_value` at
    /// `price`, capped so a single rebalance cannot grow the position's
    /// market value by more than `max_position_increase_pct * total_value`.
    pub fn position_size(
        &self,
        weight: f64,
        total_value: f64,
        price: f64,
        current_shares: i64,
    ) -> i64 {
        if price <= 0.0 || total_value <= 0.0 {
            return current_shares;
        }
        let target_value = weight * total_value;
        let current_value = current_shares as f64 * price;
        let max_increase = self.max_position_increase_pct * total_value;
        let bounded_value = if target_value > current_value {
            current_value + (target_value - current_value).min(max_increase)
        } else {
            target_value
        };
        (bounded_value / price).floor().max(0.0) as i64
    }

    /// True when a rebalance should fire: the L1 drift between current and
    /// target weights has reached `rebalance_drift_threshold` AND the
    /// configured number of days has elapsed since the last rebalance.
    /// Either condition alone is insufficient.
    pub fn should_rebalance(
        &self,
        current_weights: &BTreeMap<String, f64>,
        target_weights: &BTreeMap<String, f64>,
        days_since_last_rebalance: i64,
    ) -> bool {
        let mut symbols: Vec<&String> = current_weights.keys().chain(target_weights.keys()).collect();
        symbols.sort();
        symbols.dedup();
        let drift: f64 = symbols
            .iter()
            .map(|s| {
                let cur = current_weights.get(*s).copied().unwrap_or(0.0);
                let tgt = target_weights.get(*s).copied().unwrap_or(0.0);
                (cur - tgt).abs()
            })
            .sum();
        drift >= self.rebalance_drift_threshold && days_since_last_rebalance >= self.rebalance_frequency_days
    }
}

// ─── helpers ─────────────────────────────────────────────────────────────────

fn tail(series: &[f64], window: usize) -> &[f64] {
    if series.len() <= window {
        series
    } else {
        &series[series.len() - window..]
    }
}

fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn normalize(values: BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>, AllocationError> {
    let total: f64 = values.values().sum();
    if values.is_empty() || total <= 0.0 {
        return Err(AllocationError::AllWeightsExcluded);
    }
    Ok(values.into_iter().map(|(s, v)| (s, v / total)).collect())
}

/// Iterative equal-risk-contribution weighting: each symbol's weight is
/// scaled proportional to `1 / sigma`, then renormalized; repeated until
/// the risk contributions stop moving or the iteration cap is hit.
fn risk_parity_weights(sigmas: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let n = sigmas.len();
    let mut weights: BTreeMap<String, f64> =
        sigmas.keys().map(|s| (s.clone(), 1.0 / n as f64)).collect();

    for _ in 0..RISK_PARITY_MAX_ITERATIONS {
        let risk_contrib: BTreeMap<String, f64> = sigmas
            .iter()
            .map(|(s, sigma)| (s.clone(), weights[s] * sigma))
            .collect();
        let target = risk_contrib.values().sum::<f64>() / n as f64;
        let mut next = BTreeMap::new();
        for (symbol, sigma) in sigmas {
            let scale = if risk_contrib[symbol] > 0.0 {
                target / risk_contrib[symbol]
            } else {
                1.0
            };
            next.insert(symbol.clone(), weights[symbol] * scale);
        }
        let total: f64 = next.values().sum();
        for w in next.values_mut() {
            *w /= total;
        }
        let max_change = weights
            .iter()
            .map(|(s, w)| (next[s] - w).abs())
            .fold(0.0, f64::max);
        weights = next;
        if max_change < RISK_PARITY_CONVERGENCE {
            break;
        }
    }
    weights
}

/// Clamps every weight into `[min, max]`, then renormalizes so the set
/// still sums to its pre-clamp total; repeats a bounded number of times
/// since clamping can push the sum back out of range.
fn project_to_bounds(
    mut weights: BTreeMap<String, f64>,
    min: f64,
    max: f64,
) -> BTreeMap<String, f64> {
    let target_sum: f64 = weights.values().sum();
    for _ in 0..10 {
        for w in weights.values_mut() {
            *w = w.clamp(min, max);
        }
        let sum: f64 = weights.values().sum();
        if sum <= 0.0 || (sum - target_sum).abs() < 1e-9 {
            break;
        }
        let scale = target_sum / sum;
        for w in weights.values_mut() {
            *w *= scale;
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closes_map(pairs: &[(&str, Vec<f64>)]) -> BTreeMap<String, Vec<f64>> {
        pairs.iter().map(|(s, v)| (s.to_string(), v.clone())).collect()
    }

    #[test]
    fn equal_weight_splits_evenly() {
        let config = AllocationConfig {
            strategy: PortfolioAllocator::EqualWeight,
            ..Default::default()
        };
        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
        let weights = config.target_weights(&symbols, &BTreeMap::new()).unwrap();
        assert_eq!(weights["AAPL"], 0.5);
        assert_eq!(weights["MSFT"], 0.5);
    }

    #[test]
    fn cash_reserve_scales_down_weights() {
        let config = AllocationConfig {
            strategy: PortfolioAllocator::EqualWeight,
            cash_reserve_pct: 0.2,
            ..Default::default()
        };
        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
        let weights = config.target_weights(&symbols, &BTreeMap::new()).unwrap();
        assert!((weights["AAPL"] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn momentum_excludes_non_positive_returns() {
        let config = AllocationConfig {
            strategy: PortfolioAllocator::MomentumBased,
            ..Default::default()
        };
        let mut rising = vec![100.0; 64];
        rising[63] = 150.0;
        let falling = vec![100.0; 64];
        let symbols = vec!["UP".to_string(), "DOWN".to_string()];
        let closes = closes_map(&[("UP", rising), ("DOWN", falling)]);
        let weights = config.target_weights(&symbols, &closes).unwrap();
        assert_eq!(weights.get("DOWN"), None);
        assert!(weights["UP"] > 0.0);
    }

    #[test]
    fn custom_weights_must_reference_known_symbols() {
        let mut custom = BTreeMap::new();
        custom.insert("TSLA".to_string(), 1.0);
        let config = AllocationConfig {
            strategy: PortfolioAllocator::Custom(custom),
            ..Default::default()
        };
        let symbols = vec!["AAPL".to_string()];
        let err = config.target_weights(&symbols, &BTreeMap::new()).unwrap_err();
        assert_eq!(
            err,
            AllocationError::UnknownCustomSymbol {
                symbol: "TSLA".to_string()
            }
        );
    }

    #[test]
    fn day_threshold_alone_does_not_rebalance() {
        let config = AllocationConfig::default();
        assert!(!config.should_rebalance(&BTreeMap::new(), &BTreeMap::new(), 30));
    }

    #[test]
    fn drift_alone_does_not_rebalance() {
        let config = AllocationConfig::default();
        let mut current = BTreeMap::new();
        current.insert("AAPL".to_string(), 0.3);
        let mut target = BTreeMap::new();
        target.insert("AAPL".to_string(), 0.6);
        assert!(!config.should_rebalance(&current, &target, 0));
    }

    #[test]
    fn rebalance_fires_only_when_day_and_drift_thresholds_are_both_met() {
        let config = AllocationConfig::default();
        let mut current = BTreeMap::new();
        current.insert("AAPL".to_string(), 0.3);
        let mut target = BTreeMap::new();
        target.insert("AAPL".to_string(), 0.6);
        assert!(config.should_rebalance(&current, &target, 30));
    }

    #[test]
    fn position_size_respects_increase_cap() {
        let config = AllocationConfig {
            max_position_increase_pct: 0.1,
            ..Default::default()
        };
        let shares = config.position_size(1.0, 10_000.0, 100.0, 0);
        // capped to 10% of total value = 1000 -> 10 shares
        assert_eq!(shares, 10);
    }
}
