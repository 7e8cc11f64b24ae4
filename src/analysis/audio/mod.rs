//! Audio loading and normalization.

mod decode;
mod normalize;
mod resample;

use std::path::Path;

pub use decode::LoadError;
pub use normalize::normalize_min_max;

pub(crate) use decode::decode_audio;
pub(crate) use resample::resample_linear;

use super::AnalysisError;

/// Mono samples with their sampling rate. Never empty; the rate is never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl AudioSignal {
    /// Wrap mono samples, rejecting empty input and a zero rate.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::EmptySignal);
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Decode `path`, downmix to mono and resample to `target_rate`.
    pub fn load(path: &Path, target_rate: u32) -> Result<Self, AnalysisError> {
        let decoded = decode_audio(path)?;
        let mono = decoded.into_mono();
        let samples = if mono.sample_rate == target_rate {
            mono.samples
        } else {
            resample_linear(&mono.samples, mono.sample_rate, target_rate)
        };
        Self::new(samples, target_rate)
    }

    /// The samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sampling rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
