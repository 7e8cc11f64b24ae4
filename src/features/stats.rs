use ndarray::{ArrayView1, ArrayView2, Axis};

/// Mean of `values`; 0 when empty.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Population standard deviation of `values`; 0 when empty.
pub(crate) fn std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let var = values.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.max(0.0).sqrt()
}

/// Mean of one matrix row across frames.
pub(crate) fn row_mean(matrix: ArrayView2<'_, f64>, row: usize) -> f64 {
    mean(matrix.row(row).iter().copied())
}

/// Standard deviation of one matrix row across frames.
pub(crate) fn row_std(matrix: ArrayView2<'_, f64>, row: usize) -> f64 {
    std(&matrix.row(row).to_vec())
}

/// Apply `f` to every column (frame) and collect the per-frame values.
pub(crate) fn per_frame(
    matrix: ArrayView2<'_, f64>,
    f: impl Fn(ArrayView1<'_, f64>) -> f64,
) -> Vec<f64> {
    matrix.axis_iter(Axis(1)).map(f).collect()
}
