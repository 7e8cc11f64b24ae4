use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::config::WindowKind;

/// Window coefficients computed once per configuration and shared by every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFunction {
    kind: WindowKind,
    coefficients: Vec<f64>,
}

impl WindowFunction {
    /// Build the periodic (DFT-even) window of `length` coefficients.
    pub fn new(kind: WindowKind, length: usize) -> Self {
        let coefficients = match kind {
            WindowKind::Hann => cosine_window(length, &[0.5, 0.5]),
            WindowKind::Hamming => cosine_window(length, &[0.54, 0.46]),
            WindowKind::Blackman => cosine_window(length, &[0.42, 0.5, 0.08]),
            WindowKind::Rectangular => vec![1.0; length],
        };
        Self { kind, coefficients }
    }

    /// Which window this is.
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    /// The `win_length` coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// True for a zero-length window.
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

/// Generalized cosine window `sum_k (-1)^k a_k cos(2 pi k n / N)` with period `N = length`.
fn cosine_window(length: usize, terms: &[f64]) -> Vec<f64> {
    if length <= 1 {
        return vec![1.0; length];
    }
    let period = length as f64;
    (0..length)
        .map(|n| {
            terms
                .iter()
                .enumerate()
                .map(|(k, &a)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * a * (2.0 * PI * k as f64 * n as f64 / period).cos()
                })
                .sum()
        })
        .collect()
}

/// Forward FFT of a fixed length, planned once and shared across threads.
#[derive(Clone)]
pub(crate) struct FftPlan {
    len: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl FftPlan {
    pub(crate) fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            len,
            fft: planner.plan_fft_forward(len),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Scratch buffer sized for [`FftPlan::process`]; callers keep one per thread.
    pub(crate) fn make_scratch(&self) -> Vec<Complex64> {
        vec![Complex64::default(); self.fft.get_inplace_scratch_len()]
    }

    pub(crate) fn process(&self, buffer: &mut [Complex64], scratch: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.len);
        self.fft.process_with_scratch(buffer, scratch);
    }
}

impl std::fmt::Debug for FftPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftPlan").field("len", &self.len).finish()
    }
}
