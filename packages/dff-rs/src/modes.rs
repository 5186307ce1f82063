//! Processing strategy definitions for the ΔF/F trace pipeline.

use serde::{Deserialize, Serialize};

/// Shape of the F0 estimate a baseline mode produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineKind {
    /// One value per channel, tiled over every frame
    Constant,
    /// Frame-by-frame baseline track
    Rolling,
}

/// F0 estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMode {
    PreStimMedian,
    GlobalMedian,
    GlobalPercentile,
    RollingMedian,
    RollingMean,
    RollingPercentile,
}

impl BaselineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreStimMedian => "pre_stim_median",
            Self::GlobalMedian => "global_median",
            Self::GlobalPercentile => "global_percentile",
            Self::RollingMedian => "rolling_median",
            Self::RollingMean => "rolling_mean",
            Self::RollingPercentile => "rolling_percentile",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pre_stim_median" => Some(Self::PreStimMedian),
            "global_median" => Some(Self::GlobalMedian),
            "global_percentile" => Some(Self::GlobalPercentile),
            "rolling_median" => Some(Self::RollingMedian),
            "rolling_mean" => Some(Self::RollingMean),
            "rolling_percentile" => Some(Self::RollingPercentile),
            _ => None,
        }
    }

    pub fn kind(&self) -> BaselineKind {
        match self {
            Self::PreStimMedian | Self::GlobalMedian | Self::GlobalPercentile => {
                BaselineKind::Constant
            }
            Self::RollingMedian | Self::RollingMean | Self::RollingPercentile => {
                BaselineKind::Rolling
            }
        }
    }

    pub fn info(&self) -> &'static BaselineModeInfo {
        match self {
            Self::PreStimMedian => &PRE_STIM_MEDIAN,
            Self::GlobalMedian => &GLOBAL_MEDIAN,
            Self::GlobalPercentile => &GLOBAL_PERCENTILE,
            Self::RollingMedian => &ROLLING_MEDIAN,
            Self::RollingMean => &ROLLING_MEAN,
            Self::RollingPercentile => &ROLLING_PERCENTILE,
        }
    }
}

/// Drift removal strategy applied before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetrendMethod {
    None,
    Linear,
    RollingMedian,
}

impl DetrendMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Linear => "linear",
            Self::RollingMedian => "rolling_median",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "linear" => Some(Self::Linear),
            "rolling_median" => Some(Self::RollingMedian),
            _ => None,
        }
    }
}

/// Smoothing filter applied to the primary normalized table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMethod {
    Savgol,
    Gaussian,
}

impl FilterMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savgol => "savgol",
            Self::Gaussian => "gaussian",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "savgol" => Some(Self::Savgol),
            "gaussian" => Some(Self::Gaussian),
            _ => None,
        }
    }
}

/// Which normalized table feeds the filter stage and the saved output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    Dff,
    Subtract,
}

impl NormalizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dff => "dff",
            Self::Subtract => "subtract",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dff" => Some(Self::Dff),
            "subtract" => Some(Self::Subtract),
            _ => None,
        }
    }
}

/// Boundary extension policy for the Gaussian smoother
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Edge sample repeated into the mirror image
    Reflect,
    /// Edge sample repeated as-is
    Nearest,
    /// Mirror image without the edge sample
    Mirror,
    /// Periodic continuation
    Wrap,
}

impl BoundaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reflect => "reflect",
            Self::Nearest => "nearest",
            Self::Mirror => "mirror",
            Self::Wrap => "wrap",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reflect" => Some(Self::Reflect),
            "nearest" => Some(Self::Nearest),
            "mirror" => Some(Self::Mirror),
            "wrap" => Some(Self::Wrap),
            _ => None,
        }
    }
}

/// Complete baseline mode metadata
/// Note: Only Serialize is derived since static references can't be deserialized
#[derive(Debug, Clone, Serialize)]
pub struct BaselineModeInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: BaselineKind,
    #[serde(skip)]
    pub required_params: &'static [&'static str],
    pub documentation: &'static str,
}

impl BaselineModeInfo {
    /// Look up a mode by its configuration name
    pub fn from_name(name: &str) -> Option<&'static BaselineModeInfo> {
        BASELINE_MODE_REGISTRY.iter().find(|m| m.name == name)
    }
}

/// Pre-stimulus median
///
/// Median of the frames immediately before the stimulus. The canonical F0 for
/// evoked-response recordings.
pub const PRE_STIM_MEDIAN: BaselineModeInfo = BaselineModeInfo {
    name: "pre_stim_median",
    label: "Pre-stimulus median",
    kind: BaselineKind::Constant,
    required_params: &["stim_frame", "pre_window"],
    documentation: "Median of the frames immediately before the stimulus. The canonical F0 for evoked-response recordings.",
};

/// Global median
///
/// Median of the whole recording per channel. Robust when no stimulus timing is available.
pub const GLOBAL_MEDIAN: BaselineModeInfo = BaselineModeInfo {
    name: "global_median",
    label: "Global median",
    kind: BaselineKind::Constant,
    required_params: &[],
    documentation: "Median of the whole recording per channel. Robust when no stimulus timing is available.",
};

/// Global percentile
///
/// Low percentile of the whole recording per channel. Approximates the resting level of sparsely active traces.
pub const GLOBAL_PERCENTILE: BaselineModeInfo = BaselineModeInfo {
    name: "global_percentile",
    label: "Global percentile",
    kind: BaselineKind::Constant,
    required_params: &["global_percentile_q"],
    documentation: "Low percentile of the whole recording per channel. Approximates the resting level of sparsely active traces.",
};

/// Rolling median
///
/// Centered rolling median per channel. Tracks slow baseline drift frame by frame.
pub const ROLLING_MEDIAN: BaselineModeInfo = BaselineModeInfo {
    name: "rolling_median",
    label: "Rolling median",
    kind: BaselineKind::Rolling,
    required_params: &["rolling_window"],
    documentation: "Centered rolling median per channel. Tracks slow baseline drift frame by frame.",
};

/// Rolling mean
///
/// Centered rolling mean per channel. Smoother than the rolling median but sensitive to transients.
pub const ROLLING_MEAN: BaselineModeInfo = BaselineModeInfo {
    name: "rolling_mean",
    label: "Rolling mean",
    kind: BaselineKind::Rolling,
    required_params: &["rolling_window"],
    documentation: "Centered rolling mean per channel. Smoother than the rolling median but sensitive to transients.",
};

/// Rolling percentile
///
/// Centered rolling low percentile per channel. Drift tracking that ignores activity transients.
pub const ROLLING_PERCENTILE: BaselineModeInfo = BaselineModeInfo {
    name: "rolling_percentile",
    label: "Rolling percentile",
    kind: BaselineKind::Rolling,
    required_params: &["rolling_window", "rolling_percentile_q"],
    documentation: "Centered rolling low percentile per channel. Drift tracking that ignores activity transients.",
};

/// All baseline modes in configuration order
pub const BASELINE_MODE_REGISTRY: &[BaselineModeInfo] = &[
    PRE_STIM_MEDIAN,
    GLOBAL_MEDIAN,
    GLOBAL_PERCENTILE,
    ROLLING_MEDIAN,
    ROLLING_MEAN,
    ROLLING_PERCENTILE,
];

/// All detrend methods in configuration order
pub const DETREND_METHODS: &[DetrendMethod] = &[
    DetrendMethod::None,
    DetrendMethod::Linear,
    DetrendMethod::RollingMedian,
];

/// All filter methods in configuration order
pub const FILTER_METHODS: &[FilterMethod] = &[FilterMethod::Savgol, FilterMethod::Gaussian];

/// All normalization modes in configuration order
pub const NORMALIZATION_MODES: &[NormalizationMode] =
    &[NormalizationMode::Dff, NormalizationMode::Subtract];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_size() {
        assert_eq!(BASELINE_MODE_REGISTRY.len(), 6);
    }

    #[test]
    fn test_mode_lookup_by_name() {
        assert!(BaselineModeInfo::from_name("pre_stim_median").is_some());
        assert!(BaselineModeInfo::from_name("global_median").is_some());
        assert!(BaselineModeInfo::from_name("global_percentile").is_some());
        assert!(BaselineModeInfo::from_name("rolling_median").is_some());
        assert!(BaselineModeInfo::from_name("rolling_mean").is_some());
        assert!(BaselineModeInfo::from_name("rolling_percentile").is_some());
        assert!(BaselineModeInfo::from_name("INVALID").is_none());
    }

    #[test]
    fn test_baseline_mode_round_trip() {
        for info in BASELINE_MODE_REGISTRY {
            let mode = BaselineMode::from_str(info.name).unwrap();
            assert_eq!(mode.as_str(), info.name);
            assert_eq!(mode.info().name, info.name);
        }
    }

    #[test]
    fn test_baseline_mode_kind() {
        assert_eq!(
            BaselineMode::PreStimMedian.kind(),
            BaselineKind::Constant
        );
        assert_eq!(BaselineMode::GlobalPercentile.kind(), BaselineKind::Constant);
        assert_eq!(BaselineMode::RollingMean.kind(), BaselineKind::Rolling);
        assert_eq!(BaselineMode::RollingPercentile.kind(), BaselineKind::Rolling);
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert!(BaselineMode::from_str("median").is_none());
        assert!(DetrendMethod::from_str("quadratic").is_none());
        assert!(FilterMethod::from_str("butterworth").is_none());
        assert!(NormalizationMode::from_str("zscore").is_none());
        assert!(BoundaryMode::from_str("constant").is_none());
    }

    #[test]
    fn test_detrend_method_round_trip() {
        for method in DETREND_METHODS {
            assert_eq!(DetrendMethod::from_str(method.as_str()), Some(*method));
        }
    }

    #[test]
    fn test_serde_tags_match_as_str() {
        let json = serde_json::to_string(&BaselineMode::PreStimMedian).unwrap();
        assert_eq!(json, "\"pre_stim_median\"");
        let json = serde_json::to_string(&DetrendMethod::RollingMedian).unwrap();
        assert_eq!(json, "\"rolling_median\"");
        let json = serde_json::to_string(&FilterMethod::Savgol).unwrap();
        assert_eq!(json, "\"savgol\"");
        let json = serde_json::to_string(&NormalizationMode::Dff).unwrap();
        assert_eq!(json, "\"dff\"");
        let mode: BaselineMode = serde_json::from_str("\"rolling_percentile\"").unwrap();
        assert_eq!(mode, BaselineMode::RollingPercentile);
    }

    #[test]
    fn test_required_params() {
        let info = BaselineModeInfo::from_name("pre_stim_median").unwrap();
        assert!(info.required_params.contains(&"stim_frame"));
        let info = BaselineModeInfo::from_name("global_median").unwrap();
        assert!(info.required_params.is_empty());
    }
}
