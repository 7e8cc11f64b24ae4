use ndarray::{Array2, ArrayView2, Axis};

/// Pitch classes per octave.
pub const N_CHROMA: usize = 12;

const A440_HZ: f64 = 440.0;
const CENTER_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;
/// Rows start at A before rotation; C sits three pitch classes later.
const C_OFFSET: usize = 3;

/// Pitch-class filters over the `n_fft / 2 + 1` FFT bins, rows ordered C, C#, ..., B.
#[derive(Debug, Clone)]
pub struct ChromaFilterBank {
    weights: Array2<f64>,
}

impl ChromaFilterBank {
    /// Build Gaussian pitch-class bumps per FFT bin, L2-normalized per bin and
    /// weighted towards the octaves around C5.
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        let n_bins = n_fft / 2 + 1;
        let n_chroma = N_CHROMA as f64;
        let bin_chroma = fractional_chroma_bins(sample_rate, n_fft);
        let widths: Vec<f64> = (0..bin_chroma.len())
            .map(|i| match bin_chroma.get(i + 1) {
                Some(next) => (next - bin_chroma[i]).max(1.0),
                None => 1.0,
            })
            .collect();

        let half = (n_chroma / 2.0).round();
        let mut raw = Array2::zeros((N_CHROMA, n_bins));
        for ((chroma, bin), cell) in raw.indexed_iter_mut() {
            let distance =
                (bin_chroma[bin] - chroma as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma)
                    - half;
            *cell = (-0.5 * (2.0 * distance / widths[bin]).powi(2)).exp();
        }

        for (bin, mut column) in raw.axis_iter_mut(Axis(1)).enumerate() {
            let norm = column.iter().map(|w| w * w).sum::<f64>().sqrt();
            let octave = bin_chroma[bin] / n_chroma;
            let octave_weight = (-0.5 * ((octave - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
            let scale = if norm > f64::MIN_POSITIVE {
                octave_weight / norm
            } else {
                octave_weight
            };
            column.mapv_inplace(|w| w * scale);
        }

        let mut weights = Array2::zeros((N_CHROMA, n_bins));
        for (chroma, row) in raw.rows().into_iter().enumerate() {
            let target = (chroma + N_CHROMA - C_OFFSET) % N_CHROMA;
            weights.row_mut(target).assign(&row);
        }
        Self { weights }
    }

    /// `12 x n_bins` filter weights.
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Chromagram `filters . power`, one column per frame, no compression.
    pub fn project(&self, power: ArrayView2<'_, f64>) -> Array2<f64> {
        self.weights.dot(&power)
    }
}

/// Position of each FFT bin (all `n_fft`, DC included) on a continuous
/// pitch-class axis, 12 units per octave, 0 at A0.
fn fractional_chroma_bins(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    let n_chroma = N_CHROMA as f64;
    let reference_hz = A440_HZ / 16.0;
    let mut bins = Vec::with_capacity(n_fft.max(1));
    bins.push(0.0);
    for bin in 1..n_fft {
        let hz = bin as f64 * sample_rate as f64 / n_fft as f64;
        bins.push(n_chroma * (hz / reference_hz).log2());
    }
    // DC has no pitch; park it 1.5 octaves below the first real bin.
    if let Some(&first) = bins.get(1) {
        bins[0] = first - 1.5 * n_chroma;
    }
    bins
}
