//! Column-wise smoothing filters for trace tables.
//!
//! Both filters are NaN-aware: missing samples are filled from their
//! neighbors for the duration of the convolution and restored afterwards, so
//! gaps never bleed into adjacent frames. Columns that are entirely missing
//! pass through untouched.
//!
//! The Savitzky-Golay backend needs a linear-algebra dependency and is
//! compiled in only with the `savgol` feature (on by default); the Gaussian
//! kernel backend is always available.

use rayon::prelude::*;

use crate::error::{DffError, Result};
use crate::modes::{BoundaryMode, FilterMethod};
use crate::stats;
use crate::table::TraceTable;

/// Least-squares polynomial smoothing of one series.
///
/// Implementations are built for a fixed degree and sliding window (odd, at
/// least 3, larger than the degree) and keep edge frames on a polynomial
/// fitted to the first/last full window. `smooth` expects series at least
/// one window long.
pub trait PolynomialSmoother {
    fn smooth(&self, xs: &[f64]) -> Result<Vec<f64>>;
}

/// Gaussian smoothing of one series under a boundary policy.
pub trait GaussianSmoother {
    fn smooth(&self, xs: &[f64], sigma: f64, boundary: BoundaryMode) -> Vec<f64>;
}

/// Whether this build carries the Savitzky-Golay backend.
pub const fn has_savgol_support() -> bool {
    cfg!(feature = "savgol")
}

/// Smoothing stage. Only the fields of the selected method are consulted.
#[derive(Debug, Clone)]
pub struct FilterApplier {
    pub method: FilterMethod,
    /// Gaussian kernel width; zero or negative disables smoothing.
    pub gaussian_sigma: f64,
    pub gauss_boundary: BoundaryMode,
    /// Requested Savitzky-Golay window; rounded down to odd and clamped to
    /// the sequence length before use.
    pub savgol_window: usize,
    pub savgol_poly: usize,
}

impl Default for FilterApplier {
    fn default() -> Self {
        Self {
            method: FilterMethod::Savgol,
            gaussian_sigma: 2.0,
            gauss_boundary: BoundaryMode::Reflect,
            savgol_window: 30,
            savgol_poly: 3,
        }
    }
}

impl FilterApplier {
    pub fn apply(&self, traces: &TraceTable) -> Result<TraceTable> {
        if traces.is_empty() {
            return Ok(traces.clone());
        }
        match self.method {
            FilterMethod::Savgol => self.apply_savgol(traces),
            FilterMethod::Gaussian => self.apply_gaussian(traces),
        }
    }

    fn apply_gaussian(&self, traces: &TraceTable) -> Result<TraceTable> {
        if self.gaussian_sigma <= 0.0 {
            return Ok(traces.clone());
        }
        let sigma = self.gaussian_sigma;
        let boundary = self.gauss_boundary;
        filter_columns(traces, |col| Ok(KernelGaussian.smooth(col, sigma, boundary)))
    }

    #[cfg(feature = "savgol")]
    fn apply_savgol(&self, traces: &TraceTable) -> Result<TraceTable> {
        let n = traces.n_frames();
        // too short to fit a window; pass through before any validation
        if n < 3 {
            return Ok(traces.clone());
        }
        let (window, poly) = effective_savgol_params(self.savgol_window, self.savgol_poly, n)?;
        // the pseudo-inverse depends only on the window shape; build it once
        // for all columns
        let smoother = LstsqSavgol::new(window, poly)?;
        filter_columns(traces, |col| smoother.smooth(col))
    }

    #[cfg(not(feature = "savgol"))]
    fn apply_savgol(&self, _traces: &TraceTable) -> Result<TraceTable> {
        Err(DffError::MissingDependency("Savitzky-Golay"))
    }
}

/// Fill gaps, smooth every column in parallel, restore the gaps.
fn filter_columns<F>(traces: &TraceTable, smooth: F) -> Result<TraceTable>
where
    F: Fn(&[f64]) -> Result<Vec<f64>> + Sync,
{
    let columns = traces
        .columns()
        .par_iter()
        .map(|col| {
            if col.iter().all(|v| v.is_nan()) {
                return Ok(col.clone());
            }
            let filled = stats::fill_backward_forward(col);
            let smoothed = smooth(&filled)?;
            Ok(col
                .iter()
                .zip(smoothed)
                .map(|(&orig, s)| if orig.is_nan() { f64::NAN } else { s })
                .collect())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;
    TraceTable::new(traces.names().to_vec(), columns)
}

/// Round the requested window down to odd, clamp it to the sequence length,
/// and check it against the polynomial order.
#[cfg(feature = "savgol")]
fn effective_savgol_params(window: usize, poly: usize, n_frames: usize) -> Result<(usize, usize)> {
    let odd = if window % 2 == 0 {
        window.saturating_sub(1)
    } else {
        window
    };
    let max_odd = if n_frames % 2 == 1 {
        n_frames
    } else {
        n_frames - 1
    };
    let win = odd.min(max_odd).max(3);
    if poly >= win {
        return Err(DffError::Validation {
            param: "savgol_poly",
            reason: format!("must be less than the effective window ({})", win),
        });
    }
    if win < poly + 2 {
        return Err(DffError::Validation {
            param: "savgol_window",
            reason: format!(
                "effective window ({}) must be at least savgol_poly + 2",
                win
            ),
        });
    }
    Ok((win, poly))
}

/// Explicit kernel-build-and-convolve Gaussian backend.
pub struct KernelGaussian;

impl GaussianSmoother for KernelGaussian {
    fn smooth(&self, xs: &[f64], sigma: f64, boundary: BoundaryMode) -> Vec<f64> {
        let n = xs.len();
        if n == 0 || sigma <= 0.0 {
            return xs.to_vec();
        }
        let kernel = gaussian_kernel(sigma);
        let radius = (kernel.len() / 2) as i64;
        (0..n as i64)
            .map(|i| {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * xs[fold_index(i + k as i64 - radius, n, boundary)])
                    .sum()
            })
            .collect()
    }
}

/// Unit-sum Gaussian kernel truncated at three sigma (radius at least 1).
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = ((3.0 * sigma).round() as i64).max(1);
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Map an out-of-range sample index back into `[0, n)` under the boundary
/// policy. Index folding keeps any kernel radius safe, even one larger than
/// the sequence itself.
fn fold_index(i: i64, n: usize, boundary: BoundaryMode) -> usize {
    let n = n as i64;
    if n == 1 {
        return 0;
    }
    let idx = match boundary {
        BoundaryMode::Nearest => i.clamp(0, n - 1),
        BoundaryMode::Wrap => i.rem_euclid(n),
        // edge value repeats in the reflection: (dcba|abcd|dcba)
        BoundaryMode::Reflect => {
            let m = i.rem_euclid(2 * n);
            if m < n {
                m
            } else {
                2 * n - 1 - m
            }
        }
        // edge value is the pivot and does not repeat: (dcb|abcd|cba)
        BoundaryMode::Mirror => {
            let period = 2 * n - 2;
            let m = i.rem_euclid(period);
            if m < n {
                m
            } else {
                period - m
            }
        }
    };
    idx as usize
}

#[cfg(feature = "savgol")]
mod savgol {
    use nalgebra::{DMatrix, DVector};

    use super::PolynomialSmoother;
    use crate::error::{DffError, Result};

    /// Savitzky-Golay smoothing via the pseudo-inverse of the local
    /// least-squares design matrix, factored once per window shape.
    pub struct LstsqSavgol {
        window: usize,
        /// Row 0 of the pseudo-inverse: evaluates the fitted polynomial at
        /// the window center.
        weights: Vec<f64>,
        pinv: DMatrix<f64>,
    }

    impl LstsqSavgol {
        pub fn new(window: usize, poly: usize) -> Result<Self> {
            debug_assert!(window % 2 == 1 && window >= 3 && poly < window);
            let half = (window / 2) as f64;
            let design =
                DMatrix::from_fn(window, poly + 1, |r, c| (r as f64 - half).powi(c as i32));
            let pinv = design
                .pseudo_inverse(1e-12)
                .map_err(|e| DffError::Computation(e.to_string()))?;
            let weights = (0..window).map(|s| pinv[(0, s)]).collect();
            Ok(Self {
                window,
                weights,
                pinv,
            })
        }

        fn fit(&self, ys: &[f64]) -> Vec<f64> {
            let y = DVector::from_column_slice(ys);
            let coeffs = &self.pinv * y;
            coeffs.iter().copied().collect()
        }
    }

    impl PolynomialSmoother for LstsqSavgol {
        fn smooth(&self, xs: &[f64]) -> Result<Vec<f64>> {
            let n = xs.len();
            let window = self.window;
            debug_assert!(window <= n);
            let half = window / 2;
            let mut out = vec![0.0; n];
            for i in half..n - half {
                let mut acc = 0.0;
                for (s, w) in self.weights.iter().enumerate() {
                    acc += w * xs[i - half + s];
                }
                out[i] = acc;
            }
            // edge frames ride on polynomials fitted to the first and last
            // full windows
            let head = self.fit(&xs[..window]);
            for (i, slot) in out.iter_mut().enumerate().take(half) {
                *slot = polyval(&head, i as f64 - half as f64);
            }
            let tail = self.fit(&xs[n - window..]);
            let center = (n - 1 - half) as f64;
            for i in n - half..n {
                out[i] = polyval(&tail, i as f64 - center);
            }
            Ok(out)
        }
    }

    /// Evaluate `c0 + c1 t + c2 t^2 + ...` by Horner's rule.
    fn polyval(coeffs: &[f64], t: f64) -> f64 {
        coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }
}

#[cfg(feature = "savgol")]
pub use savgol::LstsqSavgol;
