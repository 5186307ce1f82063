//! Baseline (F0) estimation strategies.
//!
//! Constant modes reduce every channel to one representative value and tile
//! it across all frames; rolling modes track a slow per-frame baseline with a
//! centered window. Either way the result is a full baseline table plus the
//! per-channel representative used for reporting.

use crate::error::{DffError, Result};
use crate::modes::BaselineMode;
use crate::stats;
use crate::table::{ChannelVector, TraceTable};

/// Frame-by-frame baseline plus its per-channel summary.
#[derive(Debug, Clone)]
pub struct BaselineEstimate {
    /// Baseline value for every frame and channel, same shape as the input.
    pub table: TraceTable,
    /// One representative F0 per channel: the constant itself, or the median
    /// of the rolling baseline.
    pub f0: ChannelVector,
}

/// Baseline estimator. Field semantics follow the pipeline configuration;
/// only the fields used by the selected mode are validated.
#[derive(Debug, Clone)]
pub struct BaselineComputer {
    pub mode: BaselineMode,
    /// Frame index of stimulus onset; the pre-stimulus window is the frames
    /// strictly before it. Required by `pre_stim_median`.
    pub stim_frame: Option<usize>,
    /// Length of the pre-stimulus window, in frames (at least 3).
    pub pre_window: usize,
    /// Centered window length for the rolling modes (at least 3).
    pub rolling_window: usize,
    /// Percentile in [0, 100] for `global_percentile`.
    pub global_percentile_q: f64,
    /// Percentile in [0, 100] for `rolling_percentile`.
    pub rolling_percentile_q: f64,
    /// Fraction of the rolling window that must hold valid samples before a
    /// baseline value is emitted, in (0, 1].
    pub roll_min_frac: f64,
}

impl Default for BaselineComputer {
    fn default() -> Self {
        Self {
            mode: BaselineMode::PreStimMedian,
            stim_frame: None,
            pre_window: 43,
            rolling_window: 101,
            global_percentile_q: 30.0,
            rolling_percentile_q: 10.0,
            roll_min_frac: 0.2,
        }
    }
}

impl BaselineComputer {
    pub fn compute(&self, traces: &TraceTable) -> Result<BaselineEstimate> {
        match self.mode {
            BaselineMode::PreStimMedian => self.pre_stim_median(traces),
            BaselineMode::GlobalMedian => constant(traces, stats::nan_median),
            BaselineMode::GlobalPercentile => {
                let q = validate_percentile("global_percentile_q", self.global_percentile_q)?;
                constant(traces, |col| stats::nan_quantile(col, q))
            }
            BaselineMode::RollingMedian => self.rolling(traces, stats::nan_median),
            BaselineMode::RollingMean => self.rolling(traces, stats::nan_mean),
            BaselineMode::RollingPercentile => {
                let q = validate_percentile("rolling_percentile_q", self.rolling_percentile_q)?;
                self.rolling(traces, move |win| stats::nan_quantile(win, q))
            }
        }
    }

    fn pre_stim_median(&self, traces: &TraceTable) -> Result<BaselineEstimate> {
        let stim = self.stim_frame.ok_or_else(|| DffError::Validation {
            param: "stim_frame",
            reason: "the pre-stimulus baseline requires a stimulus frame".to_string(),
        })?;
        let n = traces.n_frames();
        if stim < 1 || stim > n {
            return Err(DffError::Validation {
                param: "stim_frame",
                reason: format!("{} out of range [1..{}]", stim, n),
            });
        }
        if self.pre_window < 3 {
            return Err(DffError::Validation {
                param: "pre_window",
                reason: "must cover at least 3 frames".to_string(),
            });
        }
        let start = stim.saturating_sub(self.pre_window);
        constant(traces, |col| stats::nan_median(&col[start..stim]))
    }

    fn rolling<F>(&self, traces: &TraceTable, stat: F) -> Result<BaselineEstimate>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        if self.rolling_window < 3 {
            return Err(DffError::Validation {
                param: "rolling_window",
                reason: "must cover at least 3 frames".to_string(),
            });
        }
        if !(self.roll_min_frac > 0.0 && self.roll_min_frac <= 1.0) {
            return Err(DffError::Validation {
                param: "roll_min_frac",
                reason: format!("{} is outside (0, 1]", self.roll_min_frac),
            });
        }
        let min_periods = stats::min_periods(self.rolling_window, self.roll_min_frac);
        let table = traces.par_map_columns(|_, col| {
            let rolled = stats::rolling_apply(col, self.rolling_window, min_periods, &stat);
            stats::fill_backward_forward(&rolled)
        });
        let f0 = representative(&table)?;
        Ok(BaselineEstimate { table, f0 })
    }
}

/// Reduce each channel to one value and tile it across all frames.
fn constant<F>(traces: &TraceTable, stat: F) -> Result<BaselineEstimate>
where
    F: Fn(&[f64]) -> f64,
{
    let values = traces.columns().iter().map(|col| stat(col)).collect();
    let f0 = ChannelVector::new(traces.names().to_vec(), values)?;
    let table = TraceTable::from_channel_constants(&f0, traces.n_frames());
    Ok(BaselineEstimate { table, f0 })
}

fn representative(table: &TraceTable) -> Result<ChannelVector> {
    let values = table
        .columns()
        .iter()
        .map(|col| stats::nan_median(col))
        .collect();
    ChannelVector::new(table.names().to_vec(), values)
}

fn validate_percentile(param: &'static str, q: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&q) {
        return Err(DffError::Validation {
            param,
            reason: format!("{} is outside [0, 100]", q),
        });
    }
    Ok(q / 100.0)
}
