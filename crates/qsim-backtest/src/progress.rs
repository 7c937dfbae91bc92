use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A progress checkpoint emitted partway through a replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub progress_pct: f64,
    pub current_date: NaiveDate,
    pub portfolio_value: f64,
    pub current_price: f64,
    pub current_step: usize,
    pub total_steps: usize,
}

/// Emits [`ProgressEvent`]s at roughly even intervals via an injected,
/// synchronous callback. Silent (does nothing) when no callback is set.
pub struct ProgressService {
    interval: usize,
    callback: Option<Box<dyn FnMut(ProgressEvent) + Send>>,
}

impl ProgressService {
    /// `interval` is the number of checkpoints emitted across a full run
    /// (default 20, i.e. roughly every 5%).
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: Box<dyn FnMut(ProgressEvent) + Send>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Called once per day processed. Emits only on the checkpoints that
    /// land on an `interval`-th fraction of `total_days`, plus always on
    /// the final day.
    #[allow(clippy::too_many_arguments)]
    pub fn report(
        &mut self,
        day_index: usize,
        total_days: usize,
        current_date: NaiveDate,
        portfolio_value: f64,
        current_price: f64,
    ) {
        if total_days == 0 {
            return;
        }
        let Some(callback) = self.callback.as_mut() else {
            return;
        };
        let step = (total_days / self.interval).max(1);
        let is_checkpoint = day_index % step == 0;
        let is_last = day_index + 1 == total_days;
        if is_checkpoint || is_last {
            callback(ProgressEvent {
                progress_pct: (day_index + 1) as f64 / total_days as f64 * 100.0,
                current_date,
                portfolio_value,
                current_price,
                current_step: day_index,
                total_steps: total_days,
            });
        }
    }
}

impl Default for ProgressService {
    fn default() -> Self {
        Self::new(20)
    }
}
