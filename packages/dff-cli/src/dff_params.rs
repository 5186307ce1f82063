use crate::cli::{self, RunArgs};
use dff_rs::{ConfigOverrides, NormalizationMode, PipelineConfig, TableFormat};
use std::path::{Path, PathBuf};

/// Validate a single file path: existence and supported extension.
pub fn validate_file(file_path: &str) -> Result<(), String> {
    if !Path::new(file_path).exists() {
        return Err(format!("Input file not found: {}", file_path));
    }

    if TableFormat::from_path(Path::new(file_path)).is_none() {
        let ext = Path::new(file_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        return Err(format!(
            "Unsupported file extension '{}'. Supported: csv, tsv, txt, dat",
            ext
        ));
    }

    Ok(())
}

/// Load JSON parameter overrides from an inline object or a file path.
pub fn load_overrides(params: &Option<String>) -> Result<ConfigOverrides, String> {
    let Some(params) = params else {
        return Ok(ConfigOverrides::default());
    };

    let json = if params.trim_start().starts_with('{') {
        params.clone()
    } else {
        std::fs::read_to_string(params)
            .map_err(|e| format!("Failed to read params file '{}': {}", params, e))?
    };

    ConfigOverrides::from_json(&json).map_err(|e| e.to_string())
}

/// Resolve the full pipeline configuration for a run.
///
/// Precedence, lowest to highest: built-in defaults, `--params` JSON,
/// individual flags.
pub fn build_config(args: &RunArgs) -> Result<PipelineConfig, String> {
    let overrides = load_overrides(&args.params)?;
    let mut config = PipelineConfig::default().with_overrides(&overrides);

    if let Some(v) = args.drop_first {
        config.drop_first = v;
    }
    if let Some(v) = args.stim_frame {
        config.stim_frame = Some(v);
    }
    if let Some(ref s) = args.baseline_mode {
        config.baseline_mode = cli::parse_baseline_mode(s)?;
    }
    if let Some(v) = args.pre_window {
        config.pre_window = v;
    }
    if let Some(v) = args.rolling_window {
        config.rolling_window = v;
    }
    if let Some(v) = args.baseline_rolling_window {
        config.baseline_rolling_window = Some(v);
    }
    if let Some(v) = args.detrend_rolling_window {
        config.detrend_rolling_window = Some(v);
    }
    if let Some(v) = args.global_percentile_q {
        config.global_percentile_q = v;
    }
    if let Some(v) = args.rolling_percentile_q {
        config.rolling_percentile_q = v;
    }
    if let Some(ref s) = args.detrend {
        config.detrend = cli::parse_detrend_method(s)?;
    }
    if let Some(ref s) = args.normalization_mode {
        config.normalization_mode = cli::parse_normalization_mode(s)?;
    }
    if let Some(ref s) = args.filter_method {
        config.filter_method = cli::parse_filter_method(s)?;
    }
    if let Some(v) = args.gaussian_sigma {
        config.gaussian_sigma = v;
    }
    if let Some(ref s) = args.gauss_boundary {
        config.gauss_boundary = cli::parse_boundary_mode(s)?;
    }
    if let Some(v) = args.savgol_window {
        config.savgol_window = v;
    }
    if let Some(v) = args.savgol_poly {
        config.savgol_poly = v;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Path of the saved primary table: `<output_dir>/<stem>_dff.csv` or
/// `<output_dir>/<stem>_sub.csv` depending on the primary normalization.
pub fn output_table_path(output_dir: &Path, input: &Path, mode: NormalizationMode) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("traces");
    let suffix = match mode {
        NormalizationMode::Dff => "_dff",
        NormalizationMode::Subtract => "_sub",
    };
    output_dir.join(format!("{}{}.csv", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dff_rs::{BaselineMode, DetrendMethod, FilterMethod};
    use std::io::Write;

    fn make_test_args() -> RunArgs {
        RunArgs {
            file: "/tmp/test.csv".to_string(),
            params: None,
            drop_first: None,
            stim_frame: None,
            baseline_mode: None,
            pre_window: None,
            rolling_window: None,
            baseline_rolling_window: None,
            detrend_rolling_window: None,
            global_percentile_q: None,
            rolling_percentile_q: None,
            detrend: None,
            normalization_mode: None,
            filter_method: None,
            gaussian_sigma: None,
            gauss_boundary: None,
            savgol_window: None,
            savgol_poly: None,
            output_dir: None,
            output: None,
            compact: false,
            quiet: true,
        }
    }

    #[test]
    fn test_build_config_defaults() {
        let config = build_config(&make_test_args()).unwrap();
        assert_eq!(config.drop_first, 10);
        assert_eq!(config.stim_frame, Some(44));
        assert_eq!(config.baseline_mode, BaselineMode::PreStimMedian);
        assert_eq!(config.filter_method, FilterMethod::Savgol);
    }

    #[test]
    fn test_build_config_inline_params() {
        let mut args = make_test_args();
        args.params = Some(r#"{"baseline_mode": "rolling_median", "rolling_window": 51}"#.to_string());
        let config = build_config(&args).unwrap();
        assert_eq!(config.baseline_mode, BaselineMode::RollingMedian);
        assert_eq!(config.rolling_window, 51);
        assert_eq!(config.drop_first, 10);
    }

    #[test]
    fn test_build_config_params_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"detrend": "linear", "gaussian_sigma": 1.5}}"#).unwrap();
        let mut args = make_test_args();
        args.params = Some(file.path().to_str().unwrap().to_string());
        let config = build_config(&args).unwrap();
        assert_eq!(config.detrend, DetrendMethod::Linear);
        assert_eq!(config.gaussian_sigma, 1.5);
    }

    #[test]
    fn test_flags_override_params() {
        let mut args = make_test_args();
        args.params = Some(r#"{"rolling_window": 51, "savgol_window": 15}"#.to_string());
        args.rolling_window = Some(201);
        let config = build_config(&args).unwrap();
        assert_eq!(config.rolling_window, 201);
        assert_eq!(config.savgol_window, 15);
    }

    #[test]
    fn test_build_config_unknown_mode_name() {
        let mut args = make_test_args();
        args.baseline_mode = Some("median".to_string());
        let err = build_config(&args).unwrap_err();
        assert!(err.contains("Unknown baseline mode"));
    }

    #[test]
    fn test_build_config_unknown_params_key() {
        let mut args = make_test_args();
        args.params = Some(r#"{"no_such_param": 1}"#.to_string());
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_build_config_rejects_invalid_domain() {
        let mut args = make_test_args();
        args.pre_window = Some(2);
        let err = build_config(&args).unwrap_err();
        assert!(err.contains("pre_window"));
    }

    #[test]
    fn test_validate_file_missing() {
        let err = validate_file("/nonexistent/traces.csv").unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_validate_file_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = validate_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.contains("Unsupported"));
    }

    #[test]
    fn test_validate_file_ok() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        assert!(validate_file(file.path().to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_output_table_path_suffix_tracks_primary() {
        let dir = Path::new("/out");
        let input = Path::new("/data/wt1.csv");
        assert_eq!(
            output_table_path(dir, input, NormalizationMode::Dff),
            PathBuf::from("/out/wt1_dff.csv")
        );
        assert_eq!(
            output_table_path(dir, input, NormalizationMode::Subtract),
            PathBuf::from("/out/wt1_sub.csv")
        );
    }
}
