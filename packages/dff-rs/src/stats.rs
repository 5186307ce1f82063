//! NaN-aware statistics shared by the baseline and detrend stages.
//!
//! Missing samples (NaN) are ignored by every reduction; an empty valid set
//! yields NaN rather than an error.

/// Mean over the valid values.
pub fn nan_mean(xs: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in xs {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Median over the valid values.
pub fn nan_median(xs: &[f64]) -> f64 {
    nan_quantile(xs, 0.5)
}

/// Linear-interpolated quantile over the valid values, `q` in [0, 1].
///
/// `q = 0` is the minimum and `q = 1` the maximum; interior quantiles
/// interpolate between the two nearest order statistics.
pub fn nan_quantile(xs: &[f64], q: f64) -> f64 {
    let mut valid: Vec<f64> = xs.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.sort_unstable_by(f64::total_cmp);
    let h = (valid.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        valid[lo]
    } else {
        valid[lo] + (h - lo as f64) * (valid[hi] - valid[lo])
    }
}

/// Fill missing values from the next valid sample, then the previous one.
///
/// Interior and leading gaps take the value that follows them; trailing gaps
/// take the last valid value. An all-missing series stays all-missing.
pub fn fill_backward_forward(xs: &[f64]) -> Vec<f64> {
    let mut out = xs.to_vec();
    let mut next_valid = f64::NAN;
    for v in out.iter_mut().rev() {
        if v.is_nan() {
            *v = next_valid;
        } else {
            next_valid = *v;
        }
    }
    let mut prev_valid = f64::NAN;
    for v in out.iter_mut() {
        if v.is_nan() {
            *v = prev_valid;
        } else {
            prev_valid = *v;
        }
    }
    out
}

/// Centered rolling statistic with a minimum-valid-sample threshold.
///
/// Frame `i` sees `[i - w/2, i + (w-1)/2]` truncated at the edges, so an
/// even window takes one more past frame than future. The statistic runs
/// over the valid samples only; windows with fewer than `min_periods`
/// valid samples yield NaN.
pub fn rolling_apply<F>(xs: &[f64], window: usize, min_periods: usize, stat: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    debug_assert!(window >= 1);
    let n = xs.len();
    let left = window / 2;
    let right = (window - 1) / 2;
    let mut out = Vec::with_capacity(n);
    let mut valid = Vec::with_capacity(window);
    for i in 0..n {
        let lo = i.saturating_sub(left);
        let hi = (i + right + 1).min(n);
        valid.clear();
        valid.extend(xs[lo..hi].iter().copied().filter(|v| !v.is_nan()));
        if valid.len() >= min_periods {
            out.push(stat(&valid));
        } else {
            out.push(f64::NAN);
        }
    }
    out
}

/// Minimum valid-sample count for a rolling baseline window: at least 3, or
/// the configured fraction of the window, whichever is larger.
pub fn min_periods(window: usize, min_frac: f64) -> usize {
    ((window as f64 * min_frac).ceil() as usize).max(3)
}
