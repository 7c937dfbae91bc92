/// Errors raised by the indicator primitives in this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorError {
    /// A period of zero was requested; every indicator here needs at least
    /// one bar per window.
    InvalidPeriod { period: usize },
}

impl std::fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPeriod { period } => {
                write!(f, "invalid period {period}: must be >= 1")
            }
        }
    }
}

impl std::error::Error for IndicatorError {}
