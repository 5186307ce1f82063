//! F − F0 and ΔF/F normalization against a baseline of any shape.
//!
//! Baselines broadcast the way the rest of the pipeline produces them: a full
//! table (frame-by-frame), a per-channel vector, or one scalar for everything.
//! Per-channel and table baselines align by channel name; a channel with no
//! baseline entry yields NaN (subject to the ΔF/F fill policy) and a warning
//! rather than an error.

use log::warn;

use crate::error::{DffError, Result};
use crate::table::{ChannelVector, TraceTable};

/// Baseline argument accepted by the normalization operations.
#[derive(Debug, Clone)]
pub enum Baseline {
    /// Frame-by-frame baseline with the same frame count as the signal.
    Table(TraceTable),
    /// One constant per channel, matched by name.
    PerChannel(ChannelVector),
    /// One constant for every cell.
    Scalar(f64),
}

/// Knobs of [`delta_f_over_f`], mirroring its defaults.
#[derive(Debug, Clone, Copy)]
pub struct DffOptions {
    /// Minimum absolute baseline used for division. Entries with
    /// `|F0| < eps` (NaN included) are replaced by `+eps`.
    pub eps: f64,
    /// Scale the result by 100.
    pub as_percent: bool,
    /// Clip negative responses to zero after all other cleanup.
    pub clip_negatives: bool,
    /// Replacement for NaN/Inf cells; `None` leaves them as-is.
    pub fill_value: Option<f64>,
}

impl Default for DffOptions {
    fn default() -> Self {
        Self {
            eps: 1e-12,
            as_percent: false,
            clip_negatives: false,
            fill_value: Some(0.0),
        }
    }
}

/// Pointwise `F - F0`. Missing samples and unmatched channels stay NaN.
pub fn subtract(traces: &TraceTable, baseline: &Baseline) -> Result<TraceTable> {
    check_shape(traces, baseline)?;
    Ok(combine(traces, baseline, |v, b| v - b))
}

/// `ΔF/F = (F - F0_safe) / F0_safe` with near-zero baselines replaced by
/// `eps`, then optional percent scaling, Inf→NaN cleanup, NaN fill, and
/// negative clipping, in that order.
pub fn delta_f_over_f(
    traces: &TraceTable,
    baseline: &Baseline,
    opts: &DffOptions,
) -> Result<TraceTable> {
    check_shape(traces, baseline)?;
    let eps = opts.eps;
    let raw = combine(traces, baseline, |v, b| {
        let safe = if b.abs() >= eps { b } else { eps };
        (v - safe) / safe
    });
    Ok(raw.map_columns(|_, col| col.iter().map(|&v| finish_cell(v, opts)).collect()))
}

fn finish_cell(mut v: f64, opts: &DffOptions) -> f64 {
    if opts.as_percent {
        v *= 100.0;
    }
    if v.is_infinite() {
        v = f64::NAN;
    }
    if let Some(fill) = opts.fill_value {
        if v.is_nan() {
            v = fill;
        }
    }
    if opts.clip_negatives && v < 0.0 {
        v = 0.0;
    }
    v
}

fn check_shape(traces: &TraceTable, baseline: &Baseline) -> Result<()> {
    if let Baseline::Table(b) = baseline {
        if b.n_frames() != traces.n_frames() {
            return Err(DffError::Validation {
                param: "baseline",
                reason: format!(
                    "baseline table has {} frames but the signal table has {}",
                    b.n_frames(),
                    traces.n_frames()
                ),
            });
        }
    }
    Ok(())
}

fn combine<F>(traces: &TraceTable, baseline: &Baseline, cell: F) -> TraceTable
where
    F: Fn(f64, f64) -> f64,
{
    traces.map_columns(|name, col| match baseline {
        Baseline::Scalar(b) => col.iter().map(|&v| cell(v, *b)).collect(),
        Baseline::PerChannel(vec) => match vec.get(name) {
            Some(b) => col.iter().map(|&v| cell(v, b)).collect(),
            None => missing_channel(name, col.len()),
        },
        Baseline::Table(table) => match table.column_by_name(name) {
            Some(bs) => col.iter().zip(bs).map(|(&v, &b)| cell(v, b)).collect(),
            None => missing_channel(name, col.len()),
        },
    })
}

fn missing_channel(name: &str, n_frames: usize) -> Vec<f64> {
    warn!("no baseline entry for channel '{}'", name);
    vec![f64::NAN; n_frames]
}
