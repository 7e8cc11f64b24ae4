use ndarray::{Array2, Axis};

use super::AnalysisError;
use super::fft::WindowFunction;
use crate::config::FrameConfig;

/// Splits a signal into overlapping windowed frames.
#[derive(Debug, Clone)]
pub struct Framer {
    frame: FrameConfig,
    window: WindowFunction,
}

impl Framer {
    /// Build a framer; the window is computed here once.
    pub fn new(frame: FrameConfig) -> Self {
        Self {
            window: WindowFunction::new(frame.window, frame.win_length),
            frame,
        }
    }

    /// Framing parameters.
    pub fn config(&self) -> &FrameConfig {
        &self.frame
    }

    /// Window coefficients applied to each frame.
    pub fn window(&self) -> &WindowFunction {
        &self.window
    }

    /// Produce the `win_length x n_frames` matrix of windowed frames.
    ///
    /// Frame `i` covers `signal[i * hop .. i * hop + win_length]`; the trailing
    /// partial frame is dropped rather than zero-padded.
    pub fn frame(&self, signal: &[f64]) -> Result<Array2<f64>, AnalysisError> {
        let n_frames = checked_frame_count(signal.len(), &self.frame)?;
        let win_length = self.frame.win_length;
        let mut frames = Array2::zeros((win_length, n_frames));
        for (i, mut column) in frames.axis_iter_mut(Axis(1)).enumerate() {
            let start = i * self.frame.hop_size;
            let slice = &signal[start..start + win_length];
            for ((cell, &sample), &weight) in column
                .iter_mut()
                .zip(slice)
                .zip(self.window.coefficients())
            {
                *cell = sample * weight;
            }
        }
        Ok(frames)
    }
}

/// Frame count for `len` samples, failing when not even one frame fits.
pub(crate) fn checked_frame_count(len: usize, frame: &FrameConfig) -> Result<usize, AnalysisError> {
    match frame.frame_count(len) {
        Some(n_frames) if n_frames > 0 => Ok(n_frames),
        _ => Err(AnalysisError::InsufficientSamples {
            samples: len,
            required: frame.win_length + frame.hop_size,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowKind;

    fn frame_config(win_length: usize, hop_size: usize, window: WindowKind) -> FrameConfig {
        FrameConfig {
            n_fft: win_length,
            win_length,
            hop_size,
            window,
        }
    }

    #[test]
    fn frame_count_follows_floor_formula() {
        let framer = Framer::new(frame_config(1024, 512, WindowKind::Hann));
        let signal = vec![0.5; 5000];
        let frames = framer.frame(&signal).unwrap();
        assert_eq!(frames.dim(), (1024, 7));
    }

    #[test]
    fn frames_are_windowed_slices() {
        let framer = Framer::new(frame_config(4, 2, WindowKind::Rectangular));
        let signal: Vec<f64> = (0..10).map(|v| v as f64).collect();
        let frames = framer.frame(&signal).unwrap();
        assert_eq!(frames.ncols(), 3);
        assert_eq!(frames.column(0).to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(frames.column(2).to_vec(), vec![4.0, 5.0, 6.0, 7.0]);

        let hann = Framer::new(frame_config(4, 2, WindowKind::Hann));
        let frames = hann.frame(&signal).unwrap();
        assert_eq!(frames[[0, 1]], 0.0);
        assert!((frames[[2, 1]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn short_signal_is_insufficient() {
        let framer = Framer::new(frame_config(1024, 512, WindowKind::Hann));
        let err = framer.frame(&vec![0.0; 1000]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientSamples { samples: 1000, required: 1536 }
        ));
        // Exactly one window but no hop of slack still yields zero frames.
        assert!(framer.frame(&vec![0.0; 1024]).is_err());
        assert_eq!(framer.frame(&vec![0.0; 1536]).unwrap().ncols(), 1);
    }
}
