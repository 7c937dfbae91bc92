/// The direction of a strict crossing between two series.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Crossover {
    /// `short` moved from `<= long` to `> long`.
    Above,
    /// `short` moved from `>= long` to `< long`.
    Below,
}

/// Detects strict crossovers between two equal-length series.
///
/// A crossing requires both the previous and current bar to be defined.
/// Ties (`short == long`) are never reported as a crossing themselves, but
/// they do count as the "at or below"/"at or above" side for the purpose of
/// detecting the *next* transition, per the strict `<=`/`>` rule.
pub fn crossovers(short: &[Option<f64>], long: &[Option<f64>]) -> Vec<Option<Crossover>> {
    assert_eq!(short.len(), long.len(), "series must be equal length");
    let mut out = vec![None; short.len()];
    for i in 1..short.len() {
        let (Some(prev_s), Some(prev_l)) = (short[i - 1], long[i - 1]) else {
            continue;
        };
        let (Some(cur_s), Some(cur_l)) = (short[i], long[i]) else {
            continue;
        };
        if prev_s <= prev_l && cur_s > cur_l {
            out[i] = Some(Crossover::Above);
        } else if prev_s >= prev_l && cur_s < cur_l {
            out[i] = Some(Crossover::Below);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_upward_crossing() {
        let short = vec![Some(1.0), Some(2.0), Some(4.0)];
        let long = vec![Some(2.0), Some(2.0), Some(3.0)];
        let out = crossovers(&short, &long);
        assert_eq!(out, vec![None, None, Some(Crossover::Above)]);
    }

    #[test]
    fn tie_is_not_a_crossing() {
        let short = vec![Some(2.0), Some(2.0)];
        let long = vec![Some(2.0), Some(2.0)];
        let out = crossovers(&short, &long);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn undefined_inputs_produce_no_signal() {
        let short = vec![None, Some(2.0)];
        let long = vec![Some(1.0), Some(1.0)];
        let out = crossovers(&short, &long);
        assert_eq!(out, vec![None, None]);
    }
}
