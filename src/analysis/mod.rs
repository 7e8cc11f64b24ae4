//! Signal-processing pipeline: normalization, framing, STFT, mel/MFCC and chroma.

pub mod audio;
pub mod cepstral;
pub mod chroma;
pub mod fft;
pub mod frames;
pub mod mel;
mod pipeline;
pub mod stft;

use thiserror::Error;

pub use audio::{AudioSignal, LoadError};
pub use pipeline::{Pipeline, Representations};

/// Errors raised while turning a waveform into spectral representations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No samples were supplied.
    #[error("audio signal is empty")]
    EmptySignal,
    /// The sampling rate is zero.
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    /// The signal is too short to yield a single frame.
    #[error("signal has {samples} samples; at least {required} are needed for one frame")]
    InsufficientSamples {
        /// Samples available.
        samples: usize,
        /// Minimum samples for one full frame plus one hop.
        required: usize,
    },
    /// The signal was sampled at a different rate than the pipeline was built for.
    #[error("signal sampled at {actual} Hz but the pipeline expects {expected} Hz")]
    SampleRateMismatch {
        /// Pipeline sample rate.
        expected: u32,
        /// Signal sample rate.
        actual: u32,
    },
    /// The file could not be decoded.
    #[error(transparent)]
    Load(#[from] LoadError),
}
