use crate::error::IndicatorError;

/// Wilder's relative strength index.
///
/// Undefined for the first `period` entries (there is no prior bar to form a
/// change for index 0, and the seed average needs `period` changes). The
/// seed average gain/loss is the plain mean of the first `period` up/down
/// moves; subsequent values are Wilder's exponential smoothing,
/// `avg = (avg * (period - 1) + current) / period`. Fails with
/// [`IndicatorError::InvalidPeriod`] when `period` is zero.
pub fn rsi(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { period });
    }
    let mut out = vec![None; closes.len()];
    if closes.len() <= period {
        return Ok(out);
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain: f64 = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss: f64 =
        changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;
    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for i in period..changes.len() {
        let change = changes[i];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        out[i + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(out)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_through_seed_bar() {
        let closes = vec![1.0, 2.0, 3.0, 2.0, 1.0];
        let out = rsi(&closes, 3).unwrap();
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], None);
        assert!(out[3].is_some());
        assert!(out[4].is_some());
    }

    #[test]
    fn all_gains_saturates_to_100() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out = rsi(&closes, 3).unwrap();
        assert_eq!(out[3], Some(100.0));
        assert_eq!(out[5], Some(100.0));
    }

    #[test]
    fn too_short_is_all_undefined() {
        let closes = vec![1.0, 2.0, 3.0];
        let out = rsi(&closes, 5).unwrap();
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn zero_period_is_invalid() {
        let err = rsi(&[1.0, 2.0], 0).unwrap_err();
        assert_eq!(err, IndicatorError::InvalidPeriod { period: 0 });
    }
}
