//! Pipeline configuration and result types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DffError, Result};
use crate::modes::{BaselineMode, BoundaryMode, DetrendMethod, FilterMethod, NormalizationMode};
use crate::table::{ChannelVector, TraceTable};

/// Full parameter set of one pipeline run.
///
/// `Default` mirrors the stock protocol: drop the first 10 frames, median
/// baseline over the 43 frames before stimulus frame 44, ΔF/F primary
/// normalization, Savitzky-Golay smoothing.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Leading frames discarded right after loading.
    pub drop_first: usize,
    /// Stimulus onset frame, counted on the trimmed recording. Required by
    /// the pre-stimulus baseline modes.
    pub stim_frame: Option<usize>,
    pub baseline_mode: BaselineMode,
    pub pre_window: usize,
    /// Shared rolling window, used wherever a dedicated one is not set.
    pub rolling_window: usize,
    /// Rolling-baseline window override; falls back to `rolling_window`.
    pub baseline_rolling_window: Option<usize>,
    /// Rolling-detrend window override; falls back to `rolling_window`.
    pub detrend_rolling_window: Option<usize>,
    pub global_percentile_q: f64,
    pub rolling_percentile_q: f64,
    pub detrend: DetrendMethod,
    pub normalization_mode: NormalizationMode,
    pub filter_method: FilterMethod,
    pub gaussian_sigma: f64,
    pub gauss_boundary: BoundaryMode,
    pub savgol_window: usize,
    pub savgol_poly: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            drop_first: 10,
            stim_frame: Some(44),
            baseline_mode: BaselineMode::PreStimMedian,
            pre_window: 43,
            rolling_window: 101,
            baseline_rolling_window: None,
            detrend_rolling_window: None,
            global_percentile_q: 30.0,
            rolling_percentile_q: 10.0,
            detrend: DetrendMethod::None,
            normalization_mode: NormalizationMode::Dff,
            filter_method: FilterMethod::Savgol,
            gaussian_sigma: 2.0,
            gauss_boundary: BoundaryMode::Reflect,
            savgol_window: 30,
            savgol_poly: 3,
        }
    }
}

impl PipelineConfig {
    pub fn resolved_baseline_window(&self) -> usize {
        self.baseline_rolling_window.unwrap_or(self.rolling_window)
    }

    pub fn resolved_detrend_window(&self) -> usize {
        self.detrend_rolling_window.unwrap_or(self.rolling_window)
    }

    /// Apply a set of overrides on top of this configuration; unset fields
    /// keep their current value.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(v) = overrides.drop_first {
            self.drop_first = v;
        }
        if let Some(v) = overrides.stim_frame {
            self.stim_frame = Some(v);
        }
        if let Some(v) = overrides.baseline_mode {
            self.baseline_mode = v;
        }
        if let Some(v) = overrides.pre_window {
            self.pre_window = v;
        }
        if let Some(v) = overrides.rolling_window {
            self.rolling_window = v;
        }
        if let Some(v) = overrides.baseline_rolling_window {
            self.baseline_rolling_window = Some(v);
        }
        if let Some(v) = overrides.detrend_rolling_window {
            self.detrend_rolling_window = Some(v);
        }
        if let Some(v) = overrides.global_percentile_q {
            self.global_percentile_q = v;
        }
        if let Some(v) = overrides.gaussian_sigma {
            self.gaussian_sigma = v;
        }
        if let Some(v) = overrides.rolling_percentile_q {
            self.rolling_percentile_q = v;
        }
        if let Some(v) = overrides.detrend {
            self.detrend = v;
        }
        if let Some(v) = overrides.normalization_mode {
            self.normalization_mode = v;
        }
        if let Some(v) = overrides.filter_method {
            self.filter_method = v;
        }
        if let Some(v) = overrides.savgol_window {
            self.savgol_window = v;
        }
        if let Some(v) = overrides.savgol_poly {
            self.savgol_poly = v;
        }
        self
    }

    /// Check every parameter domain that does not depend on the input table.
    /// Table-dependent bounds (stimulus frame vs. recording length, window
    /// vs. frame count) are checked by the stage that consumes them.
    pub fn validate(&self) -> Result<()> {
        if let Some(stim) = self.stim_frame {
            if stim < 1 {
                return Err(invalid("stim_frame", "must be at least 1"));
            }
        }
        if self.pre_window < 3 {
            return Err(invalid("pre_window", "must cover at least 3 frames"));
        }
        if self.rolling_window < 3 {
            return Err(invalid("rolling_window", "must cover at least 3 frames"));
        }
        if let Some(w) = self.baseline_rolling_window {
            if w < 3 {
                return Err(invalid("baseline_rolling_window", "must cover at least 3 frames"));
            }
        }
        if let Some(w) = self.detrend_rolling_window {
            if w < 3 {
                return Err(invalid("detrend_rolling_window", "must cover at least 3 frames"));
            }
        }
        if !(0.0..=100.0).contains(&self.global_percentile_q) {
            return Err(invalid("global_percentile_q", "must be within [0, 100]"));
        }
        if !(0.0..=100.0).contains(&self.rolling_percentile_q) {
            return Err(invalid("rolling_percentile_q", "must be within [0, 100]"));
        }
        if self.savgol_window < 3 {
            return Err(invalid("savgol_window", "must cover at least 3 frames"));
        }
        Ok(())
    }
}

fn invalid(param: &'static str, reason: &str) -> DffError {
    DffError::Validation {
        param,
        reason: reason.to_string(),
    }
}

/// Partial configuration, typically parsed from a JSON parameter file.
/// Unknown keys are rejected; unset fields leave the base value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub drop_first: Option<usize>,
    pub stim_frame: Option<usize>,
    pub baseline_mode: Option<BaselineMode>,
    pub pre_window: Option<usize>,
    pub rolling_window: Option<usize>,
    pub baseline_rolling_window: Option<usize>,
    pub detrend_rolling_window: Option<usize>,
    pub global_percentile_q: Option<f64>,
    pub gaussian_sigma: Option<f64>,
    pub rolling_percentile_q: Option<f64>,
    pub detrend: Option<DetrendMethod>,
    pub normalization_mode: Option<NormalizationMode>,
    pub filter_method: Option<FilterMethod>,
    pub savgol_window: Option<usize>,
    pub savgol_poly: Option<usize>,
}

impl ConfigOverrides {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| DffError::Validation {
            param: "params",
            reason: e.to_string(),
        })
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Unique id of this run.
    pub id: String,
    /// RFC3339 timestamp of when the run finished.
    pub created_at: String,
    /// The fully resolved configuration the run used.
    pub config: PipelineConfig,
    /// Frame-by-frame baseline table.
    pub f0: TraceTable,
    /// Per-channel representative baseline.
    pub f0_vec: ChannelVector,
    /// Raw traces after detrending (the detrend stage may be a no-op).
    pub detrended: TraceTable,
    /// F − F0 on the detrended traces.
    pub subtracted: TraceTable,
    /// ΔF/F on the detrended traces.
    pub dff: TraceTable,
    /// Primary normalization after smoothing.
    pub filtered: TraceTable,
    /// Which normalization the run treats as primary.
    pub primary: NormalizationMode,
}

impl PipelineOutput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        f0: TraceTable,
        f0_vec: ChannelVector,
        detrended: TraceTable,
        subtracted: TraceTable,
        dff: TraceTable,
        filtered: TraceTable,
    ) -> Self {
        let primary = config.normalization_mode;
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
            config,
            f0,
            f0_vec,
            detrended,
            subtracted,
            dff,
            filtered,
            primary,
        }
    }

    /// The unfiltered table of the primary normalization.
    pub fn primary_table(&self) -> &TraceTable {
        match self.primary {
            NormalizationMode::Dff => &self.dff,
            NormalizationMode::Subtract => &self.subtracted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.drop_first, 10);
        assert_eq!(config.stim_frame, Some(44));
        assert_eq!(config.baseline_mode, BaselineMode::PreStimMedian);
        assert_eq!(config.pre_window, 43);
        assert_eq!(config.rolling_window, 101);
        assert_eq!(config.normalization_mode, NormalizationMode::Dff);
        assert_eq!(config.filter_method, FilterMethod::Savgol);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolved_windows_fall_back_to_shared() {
        let config = PipelineConfig::default();
        assert_eq!(config.resolved_baseline_window(), 101);
        assert_eq!(config.resolved_detrend_window(), 101);

        let config = PipelineConfig {
            baseline_rolling_window: Some(51),
            detrend_rolling_window: Some(201),
            ..Default::default()
        };
        assert_eq!(config.resolved_baseline_window(), 51);
        assert_eq!(config.resolved_detrend_window(), 201);
    }

    #[test]
    fn test_overrides_merge_partially() {
        let overrides = ConfigOverrides::from_json(
            r#"{"baseline_mode": "rolling_median", "rolling_window": 51, "detrend": "linear"}"#,
        )
        .unwrap();
        let config = PipelineConfig::default().with_overrides(&overrides);
        assert_eq!(config.baseline_mode, BaselineMode::RollingMedian);
        assert_eq!(config.rolling_window, 51);
        assert_eq!(config.detrend, DetrendMethod::Linear);
        // untouched fields keep their defaults
        assert_eq!(config.drop_first, 10);
        assert_eq!(config.savgol_window, 30);
    }

    #[test]
    fn test_overrides_reject_unknown_key() {
        assert!(ConfigOverrides::from_json(r#"{"no_such_param": 1}"#).is_err());
    }

    #[test]
    fn test_overrides_reject_unknown_mode_name() {
        assert!(ConfigOverrides::from_json(r#"{"baseline_mode": "fancy"}"#).is_err());
        assert!(ConfigOverrides::from_json(r#"{"filter_method": "boxcar"}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_domains() {
        let cases = [
            PipelineConfig {
                stim_frame: Some(0),
                ..Default::default()
            },
            PipelineConfig {
                pre_window: 2,
                ..Default::default()
            },
            PipelineConfig {
                rolling_window: 2,
                ..Default::default()
            },
            PipelineConfig {
                baseline_rolling_window: Some(1),
                ..Default::default()
            },
            PipelineConfig {
                global_percentile_q: 120.0,
                ..Default::default()
            },
            PipelineConfig {
                rolling_percentile_q: -1.0,
                ..Default::default()
            },
            PipelineConfig {
                savgol_window: 2,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_validate_accepts_poly_zero() {
        // polyorder 0 is a legal Savitzky-Golay order (a plain moving average)
        let config = PipelineConfig {
            savgol_window: 5,
            savgol_poly: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_primary_table() {
        let table = TraceTable::new(vec!["a".to_string()], vec![vec![1.0]]).unwrap();
        let vec = ChannelVector::new(vec!["a".to_string()], vec![1.0]).unwrap();
        let config = PipelineConfig {
            normalization_mode: NormalizationMode::Subtract,
            ..Default::default()
        };
        let output = PipelineOutput::new(
            config,
            table.clone(),
            vec,
            table.clone(),
            TraceTable::new(vec!["a".to_string()], vec![vec![0.0]]).unwrap(),
            TraceTable::new(vec!["a".to_string()], vec![vec![9.0]]).unwrap(),
            table.clone(),
        );
        assert_eq!(output.primary, NormalizationMode::Subtract);
        assert_eq!(output.primary_table().column(0), &[0.0]);
        assert!(!output.id.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&output.created_at).is_ok());
    }

    #[test]
    fn test_output_serializes_config_echo() {
        let table = TraceTable::new(vec!["a".to_string()], vec![vec![1.0]]).unwrap();
        let vec = ChannelVector::new(vec!["a".to_string()], vec![1.0]).unwrap();
        let output = PipelineOutput::new(
            PipelineConfig::default(),
            table.clone(),
            vec,
            table.clone(),
            table.clone(),
            table.clone(),
            table.clone(),
        );
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["config"]["baseline_mode"], "pre_stim_median");
        assert_eq!(json["config"]["gauss_boundary"], "reflect");
        assert_eq!(json["primary"], "dff");
        assert_eq!(json["dff"]["a"][0], 1.0);
    }
}
