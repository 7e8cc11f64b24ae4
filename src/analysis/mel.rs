use ndarray::{Array2, ArrayView2};

use crate::config::{ConfigError, MelConfig};

/// Added before `log10` so silent bins stay finite.
pub const LOG_FLOOR: f64 = 1e-16;

const SLANEY_F_SP: f64 = 200.0 / 3.0;
const SLANEY_MIN_LOG_HZ: f64 = 1_000.0;
const SLANEY_MIN_LOG_MEL: f64 = SLANEY_MIN_LOG_HZ / SLANEY_F_SP;

/// Triangular mel filters over the `n_fft / 2 + 1` FFT bins.
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    weights: Array2<f64>,
}

impl MelFilterBank {
    /// Build `n_mels` area-normalized triangular filters spaced evenly in mel
    /// between `fmin` and `fmax`.
    ///
    /// Fails when `fmax` lies above the Nyquist frequency of `sample_rate`.
    pub fn new(sample_rate: u32, n_fft: usize, mel: &MelConfig) -> Result<Self, ConfigError> {
        mel.check(sample_rate)?;
        let n_bins = n_fft / 2 + 1;
        let bin_hz: Vec<f64> = (0..n_bins)
            .map(|bin| bin as f64 * sample_rate as f64 / n_fft as f64)
            .collect();
        let edges = mel_edges(mel);

        let mut weights = Array2::zeros((mel.n_mels, n_bins));
        for (m, mut row) in weights.rows_mut().into_iter().enumerate() {
            let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
            let rise = center - left;
            let fall = right - center;
            let area_norm = 2.0 / (right - left);
            for (cell, &hz) in row.iter_mut().zip(&bin_hz) {
                let lower = (hz - left) / rise;
                let upper = (right - hz) / fall;
                *cell = lower.min(upper).max(0.0) * area_norm;
            }
        }
        Ok(Self { weights })
    }

    /// `n_mels x n_bins` filter weights.
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// `log10(filters . power + 1e-16)`, one column per frame.
    pub fn project(&self, power: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut mel = self.weights.dot(&power);
        mel.mapv_inplace(|energy| (energy + LOG_FLOOR).log10());
        mel
    }
}

/// `n_mels + 2` filter edge frequencies in Hz.
fn mel_edges(mel: &MelConfig) -> Vec<f64> {
    let mel_min = hz_to_mel(mel.fmin, mel.htk);
    let mel_max = hz_to_mel(mel.fmax, mel.htk);
    let steps = (mel.n_mels + 1) as f64;
    (0..mel.n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / steps, mel.htk))
        .collect()
}

fn slaney_log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Hz to mel; Slaney's linear/log hybrid unless `htk` is set.
pub fn hz_to_mel(hz: f64, htk: bool) -> f64 {
    if htk {
        return 2595.0 * (1.0 + hz / 700.0).log10();
    }
    if hz >= SLANEY_MIN_LOG_HZ {
        SLANEY_MIN_LOG_MEL + (hz / SLANEY_MIN_LOG_HZ).ln() / slaney_log_step()
    } else {
        hz / SLANEY_F_SP
    }
}

/// Inverse of [`hz_to_mel`].
pub fn mel_to_hz(mel: f64, htk: bool) -> f64 {
    if htk {
        return 700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0);
    }
    if mel >= SLANEY_MIN_LOG_MEL {
        SLANEY_MIN_LOG_HZ * (slaney_log_step() * (mel - SLANEY_MIN_LOG_MEL)).exp()
    } else {
        SLANEY_F_SP * mel
    }
}
