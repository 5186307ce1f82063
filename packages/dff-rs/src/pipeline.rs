//! End-to-end pipeline: baseline, detrend, normalize, filter.
//!
//! Stage order follows the measurement protocol: the baseline is estimated on
//! the raw traces, detrending is applied to the raw traces as well, both
//! normalizations are computed against the baseline table, and only the
//! primary normalization is smoothed.

use log::info;

use crate::baseline::BaselineComputer;
use crate::detrend::Detrender;
use crate::error::Result;
use crate::filters::FilterApplier;
use crate::modes::NormalizationMode;
use crate::normalize::{self, Baseline, DffOptions};
use crate::profile_scope;
use crate::table::TraceTable;
use crate::types::{PipelineConfig, PipelineOutput};

/// Runs the whole pipeline on an in-memory trace table.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    config: PipelineConfig,
}

impl PipelineRunner {
    /// Rejects configurations whose parameters are outside their domain;
    /// table-dependent checks happen inside [`run`](Self::run).
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, traces: &TraceTable) -> Result<PipelineOutput> {
        info!(
            "Running pipeline on {} channels x {} frames (baseline: {}, detrend: {}, filter: {})",
            traces.n_channels(),
            traces.n_frames(),
            self.config.baseline_mode.as_str(),
            self.config.detrend.as_str(),
            self.config.filter_method.as_str()
        );

        let estimate = {
            profile_scope!("baseline");
            let computer = BaselineComputer {
                mode: self.config.baseline_mode,
                stim_frame: self.config.stim_frame,
                pre_window: self.config.pre_window,
                rolling_window: self.config.resolved_baseline_window(),
                global_percentile_q: self.config.global_percentile_q,
                rolling_percentile_q: self.config.rolling_percentile_q,
                ..Default::default()
            };
            computer.compute(traces)?
        };

        let detrended = {
            profile_scope!("detrend");
            let detrender = Detrender {
                method: self.config.detrend,
                rolling_window: self.config.resolved_detrend_window(),
            };
            detrender.apply(traces)?
        };

        let baseline = Baseline::Table(estimate.table.clone());
        let (subtracted, dff) = {
            profile_scope!("normalize");
            let subtracted = normalize::subtract(&detrended, &baseline)?;
            let dff = normalize::delta_f_over_f(&detrended, &baseline, &DffOptions::default())?;
            (subtracted, dff)
        };

        let primary = match self.config.normalization_mode {
            NormalizationMode::Dff => &dff,
            NormalizationMode::Subtract => &subtracted,
        };

        let filtered = {
            profile_scope!("filter");
            let applier = FilterApplier {
                method: self.config.filter_method,
                gaussian_sigma: self.config.gaussian_sigma,
                gauss_boundary: self.config.gauss_boundary,
                savgol_window: self.config.savgol_window,
                savgol_poly: self.config.savgol_poly,
            };
            applier.apply(primary)?
        };

        info!("Pipeline finished ({} primary)", self.config.normalization_mode.as_str());

        Ok(PipelineOutput::new(
            self.config.clone(),
            estimate.table,
            estimate.f0,
            detrended,
            subtracted,
            dff,
            filtered,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{BaselineMode, DetrendMethod, FilterMethod};

    fn ramp_table(n: usize, slope: f64) -> TraceTable {
        let col: Vec<f64> = (0..n).map(|i| slope * i as f64).collect();
        TraceTable::new(vec!["ROI_1".to_string()], vec![col]).unwrap()
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            stim_frame: Some(20),
            pre_window: 15,
            filter_method: FilterMethod::Gaussian,
            gaussian_sigma: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_produces_all_tables() {
        let runner = PipelineRunner::new(small_config()).unwrap();
        let output = runner.run(&ramp_table(60, 1.0)).unwrap();
        for table in [
            &output.f0,
            &output.detrended,
            &output.subtracted,
            &output.dff,
            &output.filtered,
        ] {
            assert_eq!(table.n_frames(), 60);
            assert_eq!(table.n_channels(), 1);
        }
        assert_eq!(output.f0_vec.len(), 1);
        assert_eq!(output.primary, NormalizationMode::Dff);
    }

    #[test]
    fn test_baseline_comes_from_raw_traces() {
        // On a pure ramp, linear detrending flattens everything to ~0. The
        // subtracted table still sits near -F0, which proves F0 was taken
        // from the raw traces, not the detrended ones.
        let config = PipelineConfig {
            stim_frame: Some(10),
            pre_window: 5,
            detrend: DetrendMethod::Linear,
            ..small_config()
        };
        let runner = PipelineRunner::new(config).unwrap();
        let output = runner.run(&ramp_table(20, 2.0)).unwrap();
        // raw frames 5..10 are [10, 12, 14, 16, 18], median 14
        assert_eq!(output.f0_vec.values(), &[14.0]);
        for v in output.subtracted.column(0) {
            assert!((v - (-14.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_subtract_primary_selects_subtracted_table() {
        let config = PipelineConfig {
            normalization_mode: NormalizationMode::Subtract,
            ..small_config()
        };
        let runner = PipelineRunner::new(config).unwrap();
        let output = runner.run(&ramp_table(60, 1.0)).unwrap();
        assert_eq!(output.primary, NormalizationMode::Subtract);
        // sigma 0 leaves the primary table untouched
        assert_eq!(output.filtered.column(0), output.subtracted.column(0));
    }

    #[test]
    fn test_both_normalizations_always_present() {
        let config = PipelineConfig {
            normalization_mode: NormalizationMode::Subtract,
            ..small_config()
        };
        let output = PipelineRunner::new(config)
            .unwrap()
            .run(&ramp_table(60, 1.0))
            .unwrap();
        assert!(!output.dff.is_empty());
        assert!(!output.subtracted.is_empty());
    }

    #[test]
    fn test_rolling_baseline_config_plumbs_through() {
        let config = PipelineConfig {
            baseline_mode: BaselineMode::RollingMedian,
            baseline_rolling_window: Some(5),
            stim_frame: None,
            ..small_config()
        };
        let runner = PipelineRunner::new(config).unwrap();
        let output = runner.run(&ramp_table(30, 1.0)).unwrap();
        // a 5-frame rolling median of a ramp tracks the ramp in the interior
        assert_eq!(output.f0.column(0)[10], 10.0);
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = PipelineConfig {
            pre_window: 1,
            ..Default::default()
        };
        assert!(PipelineRunner::new(config).is_err());
    }
}
