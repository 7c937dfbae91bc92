use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use qsim_portfolio::{AllocationConfig, PortfolioAllocator};
use qsim_strategy::StrategyConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which [`qsim_strategy::Strategy`] implementation to run, plus its
/// strategy-specific numeric parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum StrategySelection {
    MovingAverageCrossover { short_period: usize, long_period: usize },
    Rsi { period: usize, oversold: f64, overbought: f64 },
}

/// Fully validated backtest configuration, produced only via
/// [`BacktestConfig::from_json`] or [`BacktestConfig::validate`].
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestConfig {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub starting_capital: f64,
    pub strategy: StrategySelection,
    pub strategy_config: StrategyConfig,
    pub allocation: AllocationConfig,
}

/// Wire-format mirror of [`BacktestConfig`], matching the JSON schema. This
/// is the type `serde_json` deserializes; [`BacktestConfig::from_json`]
/// validates it into the domain type above.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct BacktestConfigWire {
    symbols: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    starting_capital: f64,
    strategy: String,
    #[serde(default)]
    strategy_parameters: BTreeMap<String, f64>,
    #[serde(default)]
    max_position_size: Option<f64>,
    #[serde(default)]
    enable_risk_management: bool,
    #[serde(default)]
    stop_loss_pct: Option<f64>,
    #[serde(default)]
    take_profit_pct: Option<f64>,
    #[serde(default)]
    allocation: Option<AllocationConfigWire>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct AllocationConfigWire {
    strategy: String,
    #[serde(default)]
    custom_weights: BTreeMap<String, f64>,
    #[serde(default)]
    cash_reserve_pct: Option<f64>,
    #[serde(default)]
    rebalance_frequency_days: Option<i64>,
    #[serde(default)]
    rebalance_drift_threshold: Option<f64>,
    #[serde(default)]
    min_position_weight: Option<f64>,
    #[serde(default)]
    max_position_weight: Option<f64>,
}

impl BacktestConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let wire: BacktestConfigWire = serde_json::from_str(json).map_err(|e| ConfigError::InvalidFormat {
            message: e.to_string(),
        })?;
        Self::from_wire(wire)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        let wire = self.to_wire();
        serde_json::to_string(&wire).map_err(|e| ConfigError::InvalidFormat {
            message: e.to_string(),
        })
    }

    fn from_wire(wire: BacktestConfigWire) -> Result<Self, ConfigError> {
        if wire.symbols.is_empty() {
            return Err(ConfigError::InvalidInput {
                message: "symbols must not be empty".to_string(),
            });
        }
        let unique: BTreeSet<&String> = wire.symbols.iter().collect();
        if unique.len() != wire.symbols.len() {
            return Err(ConfigError::InvalidInput {
                message: "symbols must not contain duplicates".to_string(),
            });
        }
        if wire.start_date > wire.end_date {
            return Err(ConfigError::OutOfRange {
                field: "start_date",
                value: format!("{} > end_date {}", wire.start_date, wire.end_date),
            });
        }
        if wire.starting_capital <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "starting_capital",
                value: wire.starting_capital.to_string(),
            });
        }

        let strategy = parse_strategy(&wire.strategy, &wire.strategy_parameters)?;

        let strategy_config = StrategyConfig {
            max_position_size: wire.max_position_size.unwrap_or(1.0),
            enable_risk_management: wire.enable_risk_management,
            stop_loss_pct: wire.stop_loss_pct.unwrap_or(0.1),
            take_profit_pct: wire.take_profit_pct.unwrap_or(0.2),
        };

        let allocation = match wire.allocation {
            Some(a) => parse_allocation(a)?,
            None => AllocationConfig::default(),
        };

        Ok(BacktestConfig {
            symbols: wire.symbols,
            start_date: wire.start_date,
            end_date: wire.end_date,
            starting_capital: wire.starting_capital,
            strategy,
            strategy_config,
            allocation,
        })
    }

    fn to_wire(&self) -> BacktestConfigWire {
        let (strategy, strategy_parameters) = match &self.strategy {
            StrategySelection::MovingAverageCrossover {
                short_period,
                long_period,
            } => {
                let mut p = BTreeMap::new();
                p.insert("short_period".to_string(), *short_period as f64);
                p.insert("long_period".to_string(), *long_period as f64);
                ("ma_crossover".to_string(), p)
            }
            StrategySelection::Rsi {
                period,
                oversold,
                overbought,
            } => {
                let mut p = BTreeMap::new();
                p.insert("period".to_string(), *period as f64);
                p.insert("oversold".to_string(), *oversold);
                p.insert("overbought".to_string(), *overbought);
                ("rsi".to_string(), p)
            }
        };

        BacktestConfigWire {
            symbols: self.symbols.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            starting_capital: self.starting_capital,
            strategy,
            strategy_parameters,
            max_position_size: Some(self.strategy_config.max_position_size),
            enable_risk_management: self.strategy_config.enable_risk_management,
            stop_loss_pct: Some(self.strategy_config.stop_loss_pct),
            take_profit_pct: Some(self.strategy_config.take_profit_pct),
            allocation: None,
        }
    }
}

fn parse_strategy(
    name: &str,
    params: &BTreeMap<String, f64>,
) -> Result<StrategySelection, ConfigError> {
    let get = |key: &'static str| -> Result<f64, ConfigError> {
        params.get(key).copied().ok_or(ConfigError::MissingRequiredField {
            field: key.to_string(),
        })
    };
    match name {
        "ma_crossover" => {
            let short_period = get("short_period")? as usize;
            let long_period = get("long_period")? as usize;
            if short_period >= long_period {
                return Err(ConfigError::InvalidInput {
                    message: "short_period must be < long_period".to_string(),
                });
            }
            Ok(StrategySelection::MovingAverageCrossover {
                short_period,
                long_period,
            })
        }
        "rsi" => {
            let period = get("period")? as usize;
            let oversold = get("oversold")?;
            let overbought = get("overbought")?;
            if !(0.0 < oversold && oversold < overbought && overbought < 100.0) {
                return Err(ConfigError::InvalidInput {
                    message: "RSI thresholds must satisfy 0 < oversold < overbought < 100".to_string(),
                });
            }
            Ok(StrategySelection::Rsi {
                period,
                oversold,
                overbought,
            })
        }
        other => Err(ConfigError::InvalidInput {
            message: format!("unknown strategy '{other}'"),
        }),
    }
}

fn parse_allocation(wire: AllocationConfigWire) -> Result<AllocationConfig, ConfigError> {
    let strategy = match wire.strategy.as_str() {
        "EQUAL_WEIGHT" => PortfolioAllocator::EqualWeight,
        "VOLATILITY_ADJUSTED" => PortfolioAllocator::VolatilityAdjusted,
        "MOMENTUM_BASED" => PortfolioAllocator::MomentumBased,
        "RISK_PARITY" => PortfolioAllocator::RiskParity,
        "CUSTOM" => PortfolioAllocator::Custom(wire.custom_weights),
        other => {
            return Err(ConfigError::InvalidInput {
                message: format!("unknown allocation strategy '{other}'"),
            })
        }
    };
    let defaults = AllocationConfig::default();
    Ok(AllocationConfig {
        strategy,
        cash_reserve_pct: wire.cash_reserve_pct.unwrap_or(defaults.cash_reserve_pct),
        rebalance_frequency_days: wire
            .rebalance_frequency_days
            .unwrap_or(defaults.rebalance_frequency_days),
        rebalance_drift_threshold: wire
            .rebalance_drift_threshold
            .unwrap_or(defaults.rebalance_drift_threshold),
        min_position_weight: wire.min_position_weight.unwrap_or(defaults.min_position_weight),
        max_position_weight: wire.max_position_weight.unwrap_or(defaults.max_position_weight),
        ..defaults
    })
}
