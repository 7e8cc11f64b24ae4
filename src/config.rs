//! Extraction configuration.
//!
//! Config keys (TOML): `sample_rate`, `n_fft`, `win_length`, `hop_size`, `window`,
//! `n_mels`, `fmin`, `fmax`, `htk`, `cep_start`, `cep_end`, `classes`, `workers`,
//! `on_error`. Every key is optional and falls back to [`ExtractionConfig::default`].
//!
//! The raw config is validated once into a [`PipelineConfig`], an immutable
//! bundle that is handed to every pipeline stage.

mod errors;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use errors::ConfigError;

/// Tapering function applied to each frame before spectral analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Periodic Hann window.
    #[default]
    Hann,
    /// Periodic Hamming window.
    Hamming,
    /// Periodic Blackman window.
    Blackman,
    /// All-ones window.
    Rectangular,
}

impl WindowKind {
    /// Config-file spelling of the window name.
    pub fn as_str(self) -> &'static str {
        match self {
            WindowKind::Hann => "hann",
            WindowKind::Hamming => "hamming",
            WindowKind::Blackman => "blackman",
            WindowKind::Rectangular => "rectangular",
        }
    }

    /// Parse a command-line window name, accepting common aliases such as `boxcar`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Some(WindowKind::Hann),
            "hamming" => Some(WindowKind::Hamming),
            "blackman" => Some(WindowKind::Blackman),
            "rectangular" | "boxcar" | "rect" => Some(WindowKind::Rectangular),
            _ => None,
        }
    }
}

/// What the dataset builder does when a file cannot be processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first failing file.
    #[default]
    Abort,
    /// Log the failure and leave the file out of the dataset.
    Skip,
}

/// User-facing extraction settings, as read from TOML or built from CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Analysis sample rate in Hz; decoded audio is resampled to it.
    pub sample_rate: u32,
    /// FFT size.
    pub n_fft: usize,
    /// Frame length in samples.
    pub win_length: usize,
    /// Frame advance in samples; defaults to `win_length / 2`.
    pub hop_size: Option<usize>,
    /// Window function applied to each frame.
    pub window: WindowKind,
    /// Number of mel filters.
    pub n_mels: usize,
    /// Lower mel filter bound in Hz.
    pub fmin: f64,
    /// Upper mel filter bound in Hz; defaults to Nyquist.
    pub fmax: Option<f64>,
    /// Use the HTK mel formula instead of Slaney's.
    pub htk: bool,
    /// First kept cepstral coefficient (inclusive).
    pub cep_start: usize,
    /// Last kept cepstral coefficient (exclusive).
    pub cep_end: usize,
    /// Ordered class list; each entry names a subdirectory of the dataset root.
    pub classes: Vec<String>,
    /// Worker thread count; defaults to the available parallelism.
    pub workers: Option<usize>,
    /// Failure handling for individual files.
    pub on_error: ErrorPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            n_fft: 1024,
            win_length: 1024,
            hop_size: None,
            window: WindowKind::Hann,
            n_mels: 40,
            fmin: 0.0,
            fmax: None,
            htk: false,
            cep_start: 1,
            cep_end: 13,
            classes: ["classical", "country", "disco", "jazz"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            workers: None,
            on_error: ErrorPolicy::Abort,
        }
    }
}

impl ExtractionConfig {
    /// Load a config from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Frame advance after applying the `win_length / 2` default.
    pub fn resolved_hop_size(&self) -> usize {
        self.hop_size.unwrap_or(self.win_length / 2)
    }

    /// Upper mel bound after applying the Nyquist default.
    pub fn resolved_fmax(&self) -> f64 {
        self.fmax.unwrap_or(self.sample_rate as f64 / 2.0)
    }

    /// Validate the signal-processing parameters.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let config = PipelineConfig {
            sample_rate: self.sample_rate,
            frame: FrameConfig {
                n_fft: self.n_fft,
                win_length: self.win_length,
                hop_size: self.resolved_hop_size(),
                window: self.window,
            },
            mel: MelConfig {
                n_mels: self.n_mels,
                fmin: self.fmin,
                fmax: self.resolved_fmax(),
                htk: self.htk,
            },
            cepstral: CepstralConfig {
                start: self.cep_start,
                end: self.cep_end,
            },
        };
        config.check()?;
        Ok(config)
    }

    /// Validate everything needed for a dataset run, including the class list.
    pub fn validate(&self) -> Result<PipelineConfig, ConfigError> {
        let pipeline = self.pipeline_config()?;
        if self.classes.is_empty() {
            return Err(ConfigError::EmptyClasses);
        }
        let mut seen = BTreeSet::new();
        for class in &self.classes {
            if !seen.insert(class.as_str()) {
                return Err(ConfigError::DuplicateClass(class.clone()));
            }
        }
        Ok(pipeline)
    }

    /// Worker count after applying the available-parallelism default.
    pub fn resolved_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// Framing parameters shared by the framer and the spectral analyzer.
///
/// Only produced by [`ExtractionConfig::pipeline_config`], so the values are
/// always consistent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameConfig {
    pub(crate) n_fft: usize,
    pub(crate) win_length: usize,
    pub(crate) hop_size: usize,
    pub(crate) window: WindowKind,
}

impl FrameConfig {
    /// FFT size.
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Frame length in samples.
    pub fn win_length(&self) -> usize {
        self.win_length
    }

    /// Frame advance in samples.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Window applied to each frame.
    pub fn window(&self) -> WindowKind {
        self.window
    }

    /// Number of full frames in a signal of `len` samples; the trailing partial frame is dropped.
    ///
    /// Returns `None` when the signal is shorter than one frame.
    pub fn frame_count(&self, len: usize) -> Option<usize> {
        len.checked_sub(self.win_length)
            .and_then(|spare| spare.checked_div(self.hop_size))
    }

    /// Number of non-negative frequency bins produced per frame.
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.win_length == 0 {
            return Err(ConfigError::InvalidWinLength);
        }
        if self.hop_size == 0 {
            return Err(ConfigError::InvalidHopSize);
        }
        if self.n_fft == 0 || self.win_length > self.n_fft {
            return Err(ConfigError::WindowExceedsFft {
                win_length: self.win_length,
                n_fft: self.n_fft,
            });
        }
        Ok(())
    }
}

/// Mel filter-bank parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MelConfig {
    pub(crate) n_mels: usize,
    pub(crate) fmin: f64,
    pub(crate) fmax: f64,
    pub(crate) htk: bool,
}

impl MelConfig {
    /// Number of triangular filters.
    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    /// Lower bound in Hz.
    pub fn fmin(&self) -> f64 {
        self.fmin
    }

    /// Upper bound in Hz, at most Nyquist.
    pub fn fmax(&self) -> f64 {
        self.fmax
    }

    /// Whether the HTK mel formula is used.
    pub fn htk(&self) -> bool {
        self.htk
    }

    /// Check the filter count and the band against the Nyquist frequency of `sample_rate`.
    pub(crate) fn check(&self, sample_rate: u32) -> Result<(), ConfigError> {
        if self.n_mels == 0 {
            return Err(ConfigError::InvalidMelCount);
        }
        let (fmin, fmax) = (self.fmin, self.fmax);
        if !fmin.is_finite() || !fmax.is_finite() || fmin < 0.0 || fmax <= fmin {
            return Err(ConfigError::InvalidFrequencyRange { fmin, fmax });
        }
        let nyquist = sample_rate as f64 / 2.0;
        if fmax > nyquist {
            return Err(ConfigError::FmaxAboveNyquist { fmax, nyquist });
        }
        Ok(())
    }
}

/// Kept cepstral coefficient range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CepstralConfig {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl CepstralConfig {
    /// First kept coefficient, at least 1.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last kept coefficient.
    pub fn end(&self) -> usize {
        self.end
    }

    /// MFCC dimensionality.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Always false for a validated range.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    fn check(&self, n_mels: usize) -> Result<(), ConfigError> {
        if self.start < 1 || self.start >= self.end {
            return Err(ConfigError::InvalidCepstralRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.end > n_mels {
            return Err(ConfigError::CepstralRangeExceedsMels {
                end: self.end,
                n_mels,
            });
        }
        Ok(())
    }
}

/// Validated, immutable signal-processing configuration.
///
/// Fields are readable through getters only; the single public way to obtain
/// one is [`ExtractionConfig::pipeline_config`] (or [`ExtractionConfig::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub(crate) sample_rate: u32,
    pub(crate) frame: FrameConfig,
    pub(crate) mel: MelConfig,
    pub(crate) cepstral: CepstralConfig,
}

impl PipelineConfig {
    /// Analysis sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Framing shared by time-domain frames and the STFT.
    pub fn frame(&self) -> &FrameConfig {
        &self.frame
    }

    /// Mel projection.
    pub fn mel(&self) -> &MelConfig {
        &self.mel
    }

    /// MFCC range.
    pub fn cepstral(&self) -> &CepstralConfig {
        &self.cepstral
    }

    /// Re-check every invariant; stages call this before building from a config.
    pub(crate) fn check(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        self.frame.check()?;
        self.mel.check(self.sample_rate)?;
        self.cepstral.check(self.mel.n_mels)
    }
}
