//! Flat error taxonomy, one enum per concern, composed by the top-level
//! [`BacktestError`] via `From`. No `thiserror`: every variant implements
//! `Display`/`std::error::Error` by hand.

use qsim_portfolio::PortfolioError;

/// Config/validation failures (§7 Validation errors).
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    InvalidInput { message: String },
    OutOfRange { field: &'static str, value: String },
    MissingRequiredField { field: String },
    InvalidFormat { message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::OutOfRange { field, value } => {
                write!(f, "field '{field}' is out of range: {value}")
            }
            Self::MissingRequiredField { field } => {
                write!(f, "missing required field: {field}")
            }
            Self::InvalidFormat { message } => write!(f, "invalid format: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Price-history failures (§7 Data errors).
#[derive(Clone, Debug, PartialEq)]
pub enum DataError {
    SymbolNotFound { symbol: String },
    InsufficientHistory { symbol: String, have: usize, need: usize },
    InvalidDateRange,
    ParsingFailed { message: String },
    StoreConnectionFailed { message: String },
    StoreQueryFailed { message: String },
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SymbolNotFound { symbol } => write!(f, "symbol not found: {symbol}"),
            Self::InsufficientHistory { symbol, have, need } => write!(
                f,
                "insufficient history for '{symbol}': have {have} bars, need {need}"
            ),
            Self::InvalidDateRange => write!(f, "invalid date range: start_date > end_date"),
            Self::ParsingFailed { message } => write!(f, "parsing failed: {message}"),
            Self::StoreConnectionFailed { message } => {
                write!(f, "price store connection failed: {message}")
            }
            Self::StoreQueryFailed { message } => write!(f, "price store query failed: {message}"),
        }
    }
}

impl std::error::Error for DataError {}

/// Order-execution failures (§7 Execution errors).
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionError {
    InsufficientFunds { symbol: String },
    InvalidSignal { symbol: String, reason: String },
    NoPosition { symbol: String },
    HoldSignal { symbol: String },
    PositionLimitExceeded { symbol: String },
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFunds { symbol } => {
                write!(f, "insufficient funds to buy '{symbol}'")
            }
            Self::InvalidSignal { symbol, reason } => {
                write!(f, "invalid signal for '{symbol}': {reason}")
            }
            Self::NoPosition { symbol } => write!(f, "no open position in '{symbol}' to sell"),
            Self::HoldSignal { symbol } => write!(f, "HOLD signal for '{symbol}' is a no-op"),
            Self::PositionLimitExceeded { symbol } => {
                write!(f, "position limit exceeded for '{symbol}'")
            }
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<PortfolioError> for ExecutionError {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::InsufficientFunds { .. } => ExecutionError::InsufficientFunds {
                symbol: String::new(),
            },
            PortfolioError::NoPosition { symbol } => ExecutionError::NoPosition { symbol },
            PortfolioError::InvalidOrderSize { .. } | PortfolioError::InvalidPrice { .. } => {
                ExecutionError::InvalidSignal {
                    symbol: String::new(),
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Orchestrator-level failures: composes the lower taxonomies plus the
/// System concerns of §7 (no more granular than "unexpected").
#[derive(Clone, Debug, PartialEq)]
pub enum BacktestError {
    Config(ConfigError),
    Data(DataError),
    Execution(ExecutionError),
    ConfigurationError { message: String },
    Unexpected { message: String },
}

impl std::fmt::Display for BacktestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Data(e) => write!(f, "{e}"),
            Self::Execution(e) => write!(f, "{e}"),
            Self::ConfigurationError { message } => write!(f, "configuration error: {message}"),
            Self::Unexpected { message } => write!(f, "unexpected error: {message}"),
        }
    }
}

impl std::error::Error for BacktestError {}

impl From<ConfigError> for BacktestError {
    fn from(e: ConfigError) -> Self {
        BacktestError::Config(e)
    }
}

impl From<DataError> for BacktestError {
    fn from(e: DataError) -> Self {
        BacktestError::Data(e)
    }
}

impl From<ExecutionError> for BacktestError {
    fn from(e: ExecutionError) -> Self {
        BacktestError::Execution(e)
    }
}
