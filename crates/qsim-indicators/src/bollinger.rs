use super::sma::{rolling_stdev, sma};
use crate::error::IndicatorError;

/// A Bollinger band triple: the middle SMA and the `k`-sigma envelope
/// around it. All three series share the SMA's undefined prefix.
#[derive(Clone, Debug, PartialEq)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger bands: `middle +/- k * population_stdev`, both over `period`
/// closes. Fails with [`IndicatorError::InvalidPeriod`] when `period` is
/// zero.
pub fn bollinger_bands(
    closes: &[f64],
    period: usize,
    k: f64,
) -> Result<BollingerBands, IndicatorError> {
    let middle = sma(closes, period)?;
    let stdev = rolling_stdev(closes, period)?;
    let mut upper = vec![None; closes.len()];
    let mut lower = vec![None; closes.len()];
    for i in 0..closes.len() {
        if let (Some(m), Some(s)) = (middle[i], stdev[i]) {
            upper[i] = Some(m + k * s);
            lower[i] = Some(m - k * s);
        }
    }
    Ok(BollingerBands {
        middle,
        upper,
        lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_straddle_the_middle() {
        let closes = vec![10.0, 11.0, 9.0, 12.0, 8.0, 13.0];
        let bands = bollinger_bands(&closes, 3, 2.0).unwrap();
        for i in 0..closes.len() {
            if let (Some(m), Some(u), Some(l)) = (bands.middle[i], bands.upper[i], bands.lower[i])
            {
                assert!(u >= m);
                assert!(l <= m);
            } else {
                assert!(bands.upper[i].is_none() && bands.lower[i].is_none());
            }
        }
    }

    #[test]
    fn zero_variance_collapses_bands_to_the_middle() {
        let closes = vec![5.0, 5.0, 5.0, 5.0];
        let bands = bollinger_bands(&closes, 3, 2.0).unwrap();
        assert_eq!(bands.upper[2], Some(5.0));
        assert_eq!(bands.lower[2], Some(5.0));
    }

    #[test]
    fn zero_period_is_invalid() {
        let err = bollinger_bands(&[1.0, 2.0], 0, 2.0).unwrap_err();
        assert_eq!(err, IndicatorError::InvalidPeriod { period: 0 });
    }
}
