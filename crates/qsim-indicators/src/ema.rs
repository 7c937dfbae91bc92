use super::sma::sma;
use crate::error::IndicatorError;

/// Exponential moving average, seeded by the simple average of the first
/// `period` closes (not the first close alone). Undefined before the seed
/// bar, matching `sma`'s lazy-start convention. Fails with
/// [`IndicatorError::InvalidPeriod`] when `period` is zero.
pub fn ema(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { period });
    }
    let mut out = vec![None; closes.len()];
    if closes.len() < period {
        return Ok(out);
    }
    let seed = sma(closes, period)?[period - 1].expect("seed window is fully populated");
    out[period - 1] = Some(seed);
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in period..closes.len() {
        let value = (closes[i] - prev) * alpha + prev;
        out[i] = Some(value);
        prev = value;
    }
    Ok(out)
}
