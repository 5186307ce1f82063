pub mod baseline;
pub mod detrend;
pub mod error;
pub mod filters;
pub mod loader;
pub mod modes;
pub mod normalize;
pub mod pipeline;
pub mod profiling;
pub mod saver;
pub mod series;
pub mod stats;
pub mod table;
pub mod types;

pub use baseline::{BaselineComputer, BaselineEstimate};
pub use detrend::Detrender;
pub use error::{DffError, Result};
#[cfg(feature = "savgol")]
pub use filters::LstsqSavgol;
pub use filters::{
    has_savgol_support, FilterApplier, GaussianSmoother, KernelGaussian, PolynomialSmoother,
};
pub use loader::{SignalLoader, TableFormat};
pub use modes::{
    BaselineKind, BaselineMode, BaselineModeInfo, BoundaryMode, DetrendMethod, FilterMethod,
    NormalizationMode, BASELINE_MODE_REGISTRY,
};
pub use normalize::{delta_f_over_f, subtract, Baseline, DffOptions};
pub use pipeline::PipelineRunner;
pub use saver::SignalSaver;
pub use series::{build_plot_data, PlotData, RoiSeries};
pub use table::{ChannelVector, TraceTable};
pub use types::{ConfigOverrides, PipelineConfig, PipelineOutput};
