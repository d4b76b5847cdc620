//! Slope comparison helpers.
//!
//! The flag check uses [`angle_between_slopes`]. The tolerance checks and
//! [`naive_slope`] are standalone utilities for callers writing their own
//! trend rules; no detector calls them.

/// Angle in degrees between the lines `y = slope1 * x` and `y = slope2 * x`.
///
/// Uses the dot product of the direction vectors `(1, slope1)` and
/// `(1, slope2)`. The cosine is clamped to `[-1, 1]` so rounding never pushes
/// `acos` out of its domain. The result lies in `[0, 180)`.
pub fn angle_between_slopes(slope1: f64, slope2: f64) -> f64 {
    let magnitudes = (1.0 + slope1 * slope1).sqrt() * (1.0 + slope2 * slope2).sqrt();
    let dot_product = 1.0 + slope1 * slope2;
    clean_cos(dot_product / magnitudes).acos().to_degrees()
}

fn clean_cos(cos_angle: f64) -> f64 {
    cos_angle.clamp(-1.0, 1.0)
}

/// True when `a` and `b` differ by less than `tolerance` relative to each of them.
pub fn within_percent_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    ((a - b) / a).abs() < tolerance && ((b - a) / b).abs() < tolerance
}

pub fn within_absolute_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// Crude trend estimate: distance of the latest value from the window mean,
/// spread over `lookback` bars. Returns `None` for an empty window or zero lookback.
pub fn naive_slope(values: &[f64], lookback: usize) -> Option<f64> {
    let last = *values.last()?;
    if lookback == 0 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some((last - mean) / lookback as f64)
}
