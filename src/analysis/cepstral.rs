use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2};

use crate::config::CepstralConfig;

/// Orthonormal DCT-II along the mel axis, restricted to rows `[start, end)`.
#[derive(Debug, Clone)]
pub struct CepstralTransform {
    basis: Array2<f64>,
    range: CepstralConfig,
}

impl CepstralTransform {
    /// Precompute the kept DCT-II basis rows for an `n_mels`-point transform.
    pub fn new(n_mels: usize, range: CepstralConfig) -> Self {
        let n = n_mels as f64;
        let basis = Array2::from_shape_fn((range.len(), n_mels), |(row, m)| {
            let k = (range.start + row) as f64;
            let scale = if k == 0.0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            scale * (PI * k * (2.0 * m as f64 + 1.0) / (2.0 * n)).cos()
        });
        Self { basis, range }
    }

    /// Kept coefficient range.
    pub fn range(&self) -> CepstralConfig {
        self.range
    }

    /// MFCC matrix of `(end - start) x n_frames`.
    pub fn apply(&self, mel_log: ArrayView2<'_, f64>) -> Array2<f64> {
        self.basis.dot(&mel_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_dct(values: &[f64]) -> Vec<f64> {
        let n = values.len() as f64;
        (0..values.len())
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                scale
                    * values
                        .iter()
                        .enumerate()
                        .map(|(m, &v)| {
                            v * (PI * k as f64 * (2.0 * m as f64 + 1.0) / (2.0 * n)).cos()
                        })
                        .sum::<f64>()
            })
            .collect()
    }

    #[test]
    fn row_count_is_range_length_for_any_frame_count() {
        let transform = CepstralTransform::new(40, CepstralConfig { start: 1, end: 13 });
        for n_frames in [1, 7, 250] {
            let mel = Array2::from_elem((40, n_frames), -3.0);
            assert_eq!(transform.apply(mel.view()).dim(), (12, n_frames));
        }
    }

    #[test]
    fn matches_direct_orthonormal_dct() {
        let values: Vec<f64> = (0..8).map(|i| (i as f64 * 0.7).sin() - 2.0).collect();
        let transform = CepstralTransform::new(8, CepstralConfig { start: 1, end: 5 });
        let mel = Array2::from_shape_vec((8, 1), values.clone()).unwrap();
        let mfcc = transform.apply(mel.view());
        let expected = full_dct(&values);
        for row in 0..4 {
            assert!((mfcc[[row, 0]] - expected[row + 1]).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_mel_vector_has_no_cepstral_content() {
        let transform = CepstralTransform::new(20, CepstralConfig { start: 1, end: 10 });
        let mel = Array2::from_elem((20, 3), -16.0);
        assert!(transform.apply(mel.view()).iter().all(|v| v.abs() < 1e-9));
    }
}
