use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating an extraction configuration.
///
/// Every variant except `Read` and `ParseToml` is produced by
/// [`super::ExtractionConfig::validate`] before any audio file is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The analysis sample rate is zero.
    #[error("sample_rate must be greater than zero")]
    InvalidSampleRate,
    /// The frame length is zero.
    #[error("win_length must be greater than zero")]
    InvalidWinLength,
    /// The frame advance is zero.
    #[error("hop_size must be greater than zero")]
    InvalidHopSize,
    /// The frame does not fit in the FFT buffer.
    #[error("win_length {win_length} must be in 1..=n_fft ({n_fft})")]
    WindowExceedsFft {
        /// Configured frame length.
        win_length: usize,
        /// Configured FFT size.
        n_fft: usize,
    },
    /// No mel filters requested.
    #[error("n_mels must be greater than zero")]
    InvalidMelCount,
    /// `fmin`/`fmax` do not describe a non-empty, finite band.
    #[error("invalid mel frequency range: fmin={fmin} fmax={fmax}")]
    InvalidFrequencyRange {
        /// Lower mel bound in Hz.
        fmin: f64,
        /// Upper mel bound in Hz.
        fmax: f64,
    },
    /// The upper mel bound lies above the Nyquist frequency.
    #[error("fmax {fmax} Hz exceeds the Nyquist frequency {nyquist} Hz")]
    FmaxAboveNyquist {
        /// Upper mel bound in Hz.
        fmax: f64,
        /// Half the analysis sample rate.
        nyquist: f64,
    },
    /// The cepstral sub-range is empty or includes coefficient 0.
    #[error("cepstral range must satisfy 1 <= cep_start < cep_end, got {start}..{end}")]
    InvalidCepstralRange {
        /// First kept coefficient.
        start: usize,
        /// One past the last kept coefficient.
        end: usize,
    },
    /// The cepstral sub-range reaches past the mel axis.
    #[error("cep_end {end} exceeds n_mels {n_mels}")]
    CepstralRangeExceedsMels {
        /// One past the last kept coefficient.
        end: usize,
        /// Number of mel filters.
        n_mels: usize,
    },
    /// No classes configured for dataset extraction.
    #[error("at least one class must be configured")]
    EmptyClasses,
    /// A class name appears more than once.
    #[error("class {0:?} is listed more than once")]
    DuplicateClass(String),
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
}
