//! Drawable per-channel series assembled from a pipeline run.
//!
//! This is the data a plotting front end needs, without any rendering: the
//! trimmed raw traces, both normalizations, the filtered primary, the
//! representative baseline, a frame axis, and the stimulus marker.

use serde::Serialize;

use crate::error::{DffError, Result};
use crate::table::{ChannelVector, TraceTable};
use crate::types::PipelineOutput;

/// Plot-ready view of one run. Field names match the serialized report.
#[derive(Debug, Clone, Serialize)]
pub struct PlotData {
    pub roi_names: Vec<String>,
    /// Frame axis of the trimmed recording, `0..n_frames`.
    pub frames: Vec<usize>,
    pub raw: TraceTable,
    pub sub: TraceTable,
    pub dff: TraceTable,
    /// Filtered primary normalization (ΔF/F or F − F0, per the run config).
    pub dff_filtered: TraceTable,
    pub f0: ChannelVector,
    pub stim_frame: Option<usize>,
}

/// One channel's series, borrowed from a [`PlotData`].
#[derive(Debug, Clone, Serialize)]
pub struct RoiSeries<'a> {
    pub name: &'a str,
    pub raw: &'a [f64],
    pub sub: &'a [f64],
    pub dff: &'a [f64],
    pub dff_filtered: &'a [f64],
    pub f0: f64,
}

/// Combine the trimmed raw traces with a pipeline result.
///
/// `raw` must be the same table the pipeline ran on; a frame-count mismatch
/// is rejected.
pub fn build_plot_data(raw: &TraceTable, output: &PipelineOutput) -> Result<PlotData> {
    if raw.n_frames() != output.dff.n_frames() {
        return Err(DffError::Validation {
            param: "raw",
            reason: format!(
                "raw table has {} frames but the pipeline output has {}",
                raw.n_frames(),
                output.dff.n_frames()
            ),
        });
    }
    Ok(PlotData {
        roi_names: raw.names().to_vec(),
        frames: (0..raw.n_frames()).collect(),
        raw: raw.clone(),
        sub: output.subtracted.clone(),
        dff: output.dff.clone(),
        dff_filtered: output.filtered.clone(),
        f0: output.f0_vec.clone(),
        stim_frame: output.config.stim_frame,
    })
}

impl PlotData {
    /// All series of one channel, or `None` if the name is unknown.
    pub fn roi(&self, name: &str) -> Option<RoiSeries<'_>> {
        Some(RoiSeries {
            name: self.roi_names.iter().find(|n| n.as_str() == name)?,
            raw: self.raw.column_by_name(name)?,
            sub: self.sub.column_by_name(name)?,
            dff: self.dff.column_by_name(name)?,
            dff_filtered: self.dff_filtered.column_by_name(name)?,
            f0: self.f0.get(name)?,
        })
    }
}
