/// Rescale samples into `[-1, 1]` with `2 * (x - min) / (max - min) - 1`.
///
/// A constant signal has no range to stretch and maps to all zeros.
pub fn normalize_min_max(samples: &[f64]) -> Vec<f64> {
    let (min, max) = samples
        .iter()
        .copied()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; samples.len()];
    }
    samples
        .iter()
        .map(|&v| (2.0 * (v - min) / range - 1.0).clamp(-1.0, 1.0))
        .collect()
}
