use clap::{Args, Parser, Subcommand};
use dff_rs::{BaselineMode, BoundaryMode, DetrendMethod, FilterMethod, NormalizationMode};

#[derive(Parser)]
#[command(
    name = "fluolab",
    version,
    about = "ΔF/F fluorescence trace processing command-line tool",
    long_about = "Process calcium imaging fluorescence traces (CSV/TSV) into ΔF/F.\n\
                  Baseline estimation, detrending, normalization and smoothing are\n\
                  configurable per run via flags or a JSON parameter file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the ΔF/F pipeline on a trace file
    Run(RunArgs),
    /// Show build and capability information
    Info(InfoArgs),
    /// List available processing strategies
    Modes(ModesArgs),
    /// Validate a trace file
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Input trace file path (CSV/TSV/TXT/DAT)
    #[arg(long)]
    pub file: String,

    /// JSON parameter overrides: inline object or a file path
    #[arg(long, env = "FLUOLAB_PARAMS")]
    pub params: Option<String>,

    /// Leading frames to discard after loading
    #[arg(long)]
    pub drop_first: Option<usize>,

    /// Stimulus onset frame (1-based, counted after trimming)
    #[arg(long)]
    pub stim_frame: Option<usize>,

    /// Baseline mode (pre_stim_median, global_median, global_percentile,
    /// rolling_median, rolling_mean, rolling_percentile)
    #[arg(long)]
    pub baseline_mode: Option<String>,

    /// Pre-stimulus window length in frames
    #[arg(long)]
    pub pre_window: Option<usize>,

    /// Shared rolling window length in frames
    #[arg(long)]
    pub rolling_window: Option<usize>,

    /// Rolling window used by the baseline only
    #[arg(long)]
    pub baseline_rolling_window: Option<usize>,

    /// Rolling window used by the detrender only
    #[arg(long)]
    pub detrend_rolling_window: Option<usize>,

    /// Percentile for the global_percentile baseline [0, 100]
    #[arg(long)]
    pub global_percentile_q: Option<f64>,

    /// Percentile for the rolling_percentile baseline [0, 100]
    #[arg(long)]
    pub rolling_percentile_q: Option<f64>,

    /// Detrend method (none, linear, rolling_median)
    #[arg(long)]
    pub detrend: Option<String>,

    /// Primary normalization (dff, subtract)
    #[arg(long)]
    pub normalization_mode: Option<String>,

    /// Smoothing filter (savgol, gaussian)
    #[arg(long)]
    pub filter_method: Option<String>,

    /// Gaussian kernel sigma in frames; 0 disables smoothing
    #[arg(long)]
    pub gaussian_sigma: Option<f64>,

    /// Gaussian boundary policy (reflect, nearest, mirror, wrap)
    #[arg(long)]
    pub gauss_boundary: Option<String>,

    /// Savitzky-Golay window length in frames
    #[arg(long)]
    pub savgol_window: Option<usize>,

    /// Savitzky-Golay polynomial order
    #[arg(long)]
    pub savgol_poly: Option<usize>,

    /// Directory for the primary normalized table (<stem>_dff.csv or <stem>_sub.csv)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Output file for the JSON report (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ModesArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input trace file path
    #[arg(long)]
    pub file: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Parse a baseline mode name.
pub fn parse_baseline_mode(s: &str) -> Result<BaselineMode, String> {
    BaselineMode::from_str(s).ok_or_else(|| {
        format!(
            "Unknown baseline mode '{}'. Valid modes: pre_stim_median, global_median, \
             global_percentile, rolling_median, rolling_mean, rolling_percentile",
            s
        )
    })
}

/// Parse a detrend method name.
pub fn parse_detrend_method(s: &str) -> Result<DetrendMethod, String> {
    DetrendMethod::from_str(s)
        .ok_or_else(|| format!("Unknown detrend method '{}'. Valid methods: none, linear, rolling_median", s))
}

/// Parse a filter method name.
pub fn parse_filter_method(s: &str) -> Result<FilterMethod, String> {
    FilterMethod::from_str(s)
        .ok_or_else(|| format!("Unknown filter method '{}'. Valid methods: savgol, gaussian", s))
}

/// Parse a normalization mode name.
pub fn parse_normalization_mode(s: &str) -> Result<NormalizationMode, String> {
    NormalizationMode::from_str(s)
        .ok_or_else(|| format!("Unknown normalization mode '{}'. Valid modes: dff, subtract", s))
}

/// Parse a Gaussian boundary policy name.
pub fn parse_boundary_mode(s: &str) -> Result<BoundaryMode, String> {
    BoundaryMode::from_str(s)
        .ok_or_else(|| format!("Unknown boundary mode '{}'. Valid modes: reflect, nearest, mirror, wrap", s))
}
