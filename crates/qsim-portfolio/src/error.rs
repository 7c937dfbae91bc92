/// Errors raised while mutating a [`crate::Portfolio`].
#[derive(Clone, Debug, PartialEq)]
pub enum PortfolioError {
    InsufficientFunds { required: f64, available: f64 },
    NoPosition { symbol: String },
    InvalidOrderSize { shares: i64 },
    InvalidPrice { price: f64 },
}

impl std::fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "insufficient funds: required {required:.2}, available {available:.2}"
            ),
            Self::NoPosition { symbol } => write!(f, "no open position in '{symbol}'"),
            Self::InvalidOrderSize { shares } => {
                write!(f, "order size must be > 0, got {shares}")
            }
            Self::InvalidPrice { price } => write!(f, "price must be > 0, got {price}"),
        }
    }
}

impl std::error::Error for PortfolioError {}
