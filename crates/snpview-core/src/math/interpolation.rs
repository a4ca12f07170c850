//! Piecewise-linear interpolation over an increasing abscissa

/// Interpolate `ys` at `x`, holding the end values outside `xs`
///
/// `xs` must be strictly increasing and the same length as `ys`. Returns
/// `None` when the slices are empty or of different length.
pub fn interp_hold(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }
    lerp_hold(xs.len(), |i| xs[i], |i| ys[i], x)
}

/// Same as [`interp_hold`] over `(x, y)` points sorted by `x`
pub fn interp_points_hold(points: &[(f64, f64)], x: f64) -> Option<f64> {
    lerp_hold(points.len(), |i| points[i].0, |i| points[i].1, x)
}

fn lerp_hold(
    n: usize,
    x_at: impl Fn(usize) -> f64,
    y_at: impl Fn(usize) -> f64,
    x: f64,
) -> Option<f64> {
    if n == 0 {
        return None;
    }
    if x <= x_at(0) {
        return Some(y_at(0));
    }
    if x >= x_at(n - 1) {
        return Some(y_at(n - 1));
    }

    // Binary search for the bracketing interval; 1 <= upper <= n - 1 here
    let (mut lo, mut hi) = (0, n - 1);
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if x_at(mid) < x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let t = (x - x_at(lo)) / (x_at(hi) - x_at(lo));
    Some(y_at(lo) * (1.0 - t) + y_at(hi) * t)
}
