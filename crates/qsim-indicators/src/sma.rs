use crate::error::IndicatorError;

/// Simple moving average over `closes`, lazy: the first `period - 1` entries
/// are `None` (undefined — there is not yet enough history to average).
///
/// `period` must be >= 1. A `period` of 1 returns the input series verbatim
/// wrapped in `Some`. Fails with [`IndicatorError::InvalidPeriod`] when
/// `period` is zero.
pub fn sma(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { period });
    }
    let mut out = vec![None; closes.len()];
    if closes.len() < period {
        return Ok(out);
    }
    let mut window_sum: f64 = closes[..period].iter().sum();
    out[period - 1] = Some(window_sum / period as f64);
    for i in period..closes.len() {
        window_sum += closes[i] - closes[i - period];
        out[i] = Some(window_sum / period as f64);
    }
    Ok(out)
}

/// Population standard deviation of `closes[i - period + 1 ..= i]` for each
/// `i`, undefined (`None`) wherever the backing SMA is undefined.
pub fn rolling_stdev(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    let means = sma(closes, period)?;
    let mut out = vec![None; closes.len()];
    for i in 0..closes.len() {
        let Some(mean) = means[i] else { continue };
        let window = &closes[i + 1 - period..=i];
        let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / period as f64;
        out[i] = Some(variance.sqrt());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_until_period_minus_one() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&closes, 3).unwrap();
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
        assert_eq!(out[4], Some(4.0));
    }

    #[test]
    fn period_one_is_identity() {
        let closes = vec![10.0, 20.0, 30.0];
        let out = sma(&closes, 1).unwrap();
        assert_eq!(out, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn shorter_than_period_is_all_undefined() {
        let closes = vec![1.0, 2.0];
        let out = sma(&closes, 5).unwrap();
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn zero_period_is_invalid() {
        let err = sma(&[1.0, 2.0], 0).unwrap_err();
        assert_eq!(err, IndicatorError::InvalidPeriod { period: 0 });
    }
}
