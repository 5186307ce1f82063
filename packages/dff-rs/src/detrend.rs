//! Slow-drift removal applied to the raw traces before normalization.

use crate::error::{DffError, Result};
use crate::modes::DetrendMethod;
use crate::stats;
use crate::table::TraceTable;

/// Detrending stage. `rolling_window` is only consulted (and validated) by
/// the rolling-median method.
#[derive(Debug, Clone)]
pub struct Detrender {
    pub method: DetrendMethod,
    /// Centered window for the rolling-median trend, odd and at least 5.
    pub rolling_window: usize,
}

impl Default for Detrender {
    fn default() -> Self {
        Self {
            method: DetrendMethod::None,
            rolling_window: 201,
        }
    }
}

impl Detrender {
    pub fn apply(&self, traces: &TraceTable) -> Result<TraceTable> {
        match self.method {
            DetrendMethod::None => Ok(traces.clone()),
            DetrendMethod::Linear => Ok(traces.par_map_columns(|_, col| linear_residuals(col))),
            DetrendMethod::RollingMedian => {
                if self.rolling_window < 5 || self.rolling_window % 2 == 0 {
                    return Err(DffError::Validation {
                        param: "detrend_rolling_window",
                        reason: "must be odd and at least 5".to_string(),
                    });
                }
                let window = self.rolling_window;
                Ok(traces.par_map_columns(move |_, col| {
                    let trend = stats::rolling_apply(col, window, 1, stats::nan_median);
                    col.iter().zip(&trend).map(|(v, t)| v - t).collect()
                }))
            }
        }
    }
}

/// Residuals of an ordinary least-squares line fitted to the valid samples.
///
/// The fit ignores missing frames but the line is evaluated everywhere, so
/// NaN inputs stay NaN. Columns with fewer than two valid samples pass
/// through unchanged.
fn linear_residuals(col: &[f64]) -> Vec<f64> {
    let valid: Vec<(f64, f64)> = col
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, &v)| (i as f64, v))
        .collect();
    if valid.len() < 2 {
        return col.to_vec();
    }
    let n = valid.len() as f64;
    let mean_x = valid.iter().map(|&(x, _)| x).sum::<f64>() / n;
    let mean_y = valid.iter().map(|&(_, y)| y).sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in &valid {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx == 0.0 {
        return col.to_vec();
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    col.iter()
        .enumerate()
        .map(|(i, &v)| v - (slope * i as f64 + intercept))
        .collect()
}
