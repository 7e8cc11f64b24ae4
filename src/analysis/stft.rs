use ndarray::{Array2, ArrayView2, Axis};
use rustfft::num_complex::Complex64;

use super::fft::FftPlan;
use crate::config::FrameConfig;

/// Short-time power spectrum over the framer's windowed frames.
///
/// The analyzer consumes the frame matrix itself, so its column count always
/// equals the framer's `n_frames`.
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    frame: FrameConfig,
    plan: FftPlan,
}

impl SpectralAnalyzer {
    /// Plan the `n_fft`-point FFT for these framing parameters.
    pub fn new(frame: FrameConfig) -> Self {
        Self {
            plan: FftPlan::new(frame.n_fft),
            frame,
        }
    }

    /// `|FFT|^2` of each frame, keeping the `n_fft / 2 + 1` non-negative bins.
    ///
    /// Frames shorter than `n_fft` are zero-padded on both sides, centered.
    pub fn power_spectrogram(&self, frames: ArrayView2<'_, f64>) -> Array2<f64> {
        let n_fft = self.plan.len();
        let win_length = self.frame.win_length;
        debug_assert_eq!(frames.nrows(), win_length);
        let offset = (n_fft - win_length) / 2;
        let n_bins = self.frame.n_bins();

        let mut power = Array2::zeros((n_bins, frames.ncols()));
        let mut buffer = vec![Complex64::default(); n_fft];
        let mut scratch = self.plan.make_scratch();
        for (frame, mut column) in frames.axis_iter(Axis(1)).zip(power.axis_iter_mut(Axis(1))) {
            buffer.fill(Complex64::default());
            for (cell, &sample) in buffer[offset..offset + win_length].iter_mut().zip(frame) {
                *cell = Complex64::new(sample, 0.0);
            }
            self.plan.process(&mut buffer, &mut scratch);
            for (out, bin) in column.iter_mut().zip(&buffer[..n_bins]) {
                *out = bin.norm_sqr();
            }
        }
        power
    }
}
