/// A boundary crossing of an RSI series.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RsiBoundaryCross {
    /// RSI rose from at-or-below `oversold` to above it.
    ExitedOversold,
    /// RSI fell from at-or-above `overbought` to below it.
    ExitedOverbought,
}

/// Detects strict crossings of the oversold/overbought boundaries, the same
/// `<=`/`>` convention as [`crate::crossover::crossovers`].
pub fn rsi_boundary_crossings(
    rsi: &[Option<f64>],
    oversold: f64,
    overbought: f64,
) -> Vec<Option<RsiBoundaryCross>> {
    let mut out = vec![None; rsi.len()];
    for i in 1..rsi.len() {
        let (Some(prev), Some(cur)) = (rsi[i - 1], rsi[i]) else {
            continue;
        };
        if prev <= oversold && cur > oversold {
            out[i] = Some(RsiBoundaryCross::ExitedOversold);
        } else if prev >= overbought && cur < overbought {
            out[i] = Some(RsiBoundaryCross::ExitedOverbought);
        }
    }
    out
}
