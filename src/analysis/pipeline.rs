use std::path::Path;

use ndarray::Array2;

use super::AnalysisError;
use super::audio::{AudioSignal, normalize_min_max};
use super::cepstral::CepstralTransform;
use super::chroma::ChromaFilterBank;
use super::frames::Framer;
use super::mel::MelFilterBank;
use super::stft::SpectralAnalyzer;
use crate::config::{ConfigError, ExtractionConfig, PipelineConfig};

/// Every representation computed for one file. Built once, then only read.
#[derive(Debug, Clone)]
pub struct Representations {
    /// Analysis sample rate in Hz.
    pub sample_rate: u32,
    /// FFT size the spectral matrices were computed with.
    pub n_fft: usize,
    /// Min-max normalized samples in `[-1, 1]`.
    pub audio: Vec<f64>,
    /// Windowed frames, `win_length x n_frames`.
    pub frames: Array2<f64>,
    /// Power spectrogram, `(n_fft / 2 + 1) x n_frames`.
    pub stft: Array2<f64>,
    /// Log-mel spectrogram, `n_mels x n_frames`.
    pub mel_log: Array2<f64>,
    /// Cepstral coefficients, `(cep_end - cep_start) x n_frames`.
    pub mfcc: Array2<f64>,
    /// Chromagram, `12 x n_frames`.
    pub chroma: Array2<f64>,
}

impl Representations {
    /// Number of analysis frames shared by every matrix.
    pub fn n_frames(&self) -> usize {
        self.frames.ncols()
    }

    /// Center frequency of an STFT row in Hz.
    pub fn bin_hz(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate as f64 / self.n_fft as f64
    }
}

/// One configured instance of the full waveform-to-representations pipeline.
///
/// Filter banks, window and FFT plan are built once in [`Pipeline::new`]; the
/// pipeline holds no mutable state and can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    framer: Framer,
    analyzer: SpectralAnalyzer,
    mel: MelFilterBank,
    cepstral: CepstralTransform,
    chroma: ChromaFilterBank,
}

impl Pipeline {
    /// Build every stage from a validated configuration.
    ///
    /// The configuration is checked again here, so no stage is ever built
    /// from inconsistent parameters.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.check()?;
        let frame = config.frame;
        tracing::debug!(
            "Building pipeline: sr={} n_fft={} win={} hop={} window={} n_mels={} mfcc={}..{}",
            config.sample_rate,
            frame.n_fft,
            frame.win_length,
            frame.hop_size,
            frame.window.as_str(),
            config.mel.n_mels,
            config.cepstral.start,
            config.cepstral.end
        );
        Ok(Self {
            framer: Framer::new(frame),
            analyzer: SpectralAnalyzer::new(frame),
            mel: MelFilterBank::new(config.sample_rate, frame.n_fft, &config.mel)?,
            cepstral: CepstralTransform::new(config.mel.n_mels, config.cepstral),
            chroma: ChromaFilterBank::new(config.sample_rate, frame.n_fft),
            config,
        })
    }

    /// Validate the signal parameters of `config` and build the pipeline.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        Self::new(config.pipeline_config()?)
    }

    /// The validated configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on an in-memory signal.
    pub fn analyze(&self, signal: &AudioSignal) -> Result<Representations, AnalysisError> {
        if signal.sample_rate() != self.config.sample_rate {
            return Err(AnalysisError::SampleRateMismatch {
                expected: self.config.sample_rate,
                actual: signal.sample_rate(),
            });
        }
        let audio = normalize_min_max(signal.samples());
        let frames = self.framer.frame(&audio)?;
        let stft = self.analyzer.power_spectrogram(frames.view());
        let mel_log = self.mel.project(stft.view());
        let mfcc = self.cepstral.apply(mel_log.view());
        let chroma = self.chroma.project(stft.view());
        Ok(Representations {
            sample_rate: self.config.sample_rate,
            n_fft: self.config.frame.n_fft,
            audio,
            frames,
            stft,
            mel_log,
            mfcc,
            chroma,
        })
    }

    /// Load `path` at the pipeline's sample rate and analyze it.
    pub fn analyze_path(&self, path: &Path) -> Result<Representations, AnalysisError> {
        let signal = AudioSignal::load(path, self.config.sample_rate)?;
        tracing::debug!(
            "Loaded {} ({:.2}s, {} samples)",
            path.display(),
            signal.duration_seconds(),
            signal.len()
        );
        self.analyze(&signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::chroma::N_CHROMA;
    use crate::config::CepstralConfig;
    use std::f64::consts::PI;

    fn tone(sample_rate: u32, len: usize) -> AudioSignal {
        let samples = (0..len)
            .map(|n| {
                let t = n as f64 / sample_rate as f64;
                0.6 * (2.0 * PI * 220.0 * t).sin() + 0.3 * (2.0 * PI * 1_320.0 * t).sin()
            })
            .collect();
        AudioSignal::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn shapes_follow_configuration() {
        let pipeline = Pipeline::from_config(&ExtractionConfig::default()).unwrap();
        let reps = pipeline.analyze(&tone(22_050, 5000)).unwrap();
        assert_eq!(reps.n_frames(), 7);
        assert_eq!(reps.frames.dim(), (1024, 7));
        assert_eq!(reps.stft.dim(), (513, 7));
        assert_eq!(reps.mel_log.dim(), (40, 7));
        assert_eq!(reps.mfcc.dim(), (12, 7));
        assert_eq!(reps.chroma.dim(), (N_CHROMA, 7));
        assert!(reps.audio.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn constant_signal_stays_finite() {
        let pipeline = Pipeline::from_config(&ExtractionConfig::default()).unwrap();
        let signal = AudioSignal::new(vec![0.4; 4096], 22_050).unwrap();
        let reps = pipeline.analyze(&signal).unwrap();
        assert!(reps.audio.iter().all(|&v| v == 0.0));
        assert!(reps.mel_log.iter().all(|v| v.is_finite()));
        assert!(reps.mfcc.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn analysis_is_deterministic() {
        let pipeline = Pipeline::from_config(&ExtractionConfig::default()).unwrap();
        let signal = tone(22_050, 22_050);
        let a = pipeline.analyze(&signal).unwrap();
        let b = pipeline.analyze(&signal).unwrap();
        assert_eq!(a.mfcc, b.mfcc);
        assert_eq!(a.chroma, b.chroma);
    }

    #[test]
    fn rejects_signal_at_other_rate() {
        let pipeline = Pipeline::from_config(&ExtractionConfig::default()).unwrap();
        let err = pipeline.analyze(&tone(16_000, 8000)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::SampleRateMismatch { expected: 22_050, actual: 16_000 }
        ));
    }

    #[test]
    fn inconsistent_configs_never_reach_a_stage() {
        let valid = ExtractionConfig::default().pipeline_config().unwrap();

        let mut no_hop = valid;
        no_hop.frame.hop_size = 0;
        assert!(matches!(Pipeline::new(no_hop), Err(ConfigError::InvalidHopSize)));

        let mut wide_cepstrum = valid;
        wide_cepstrum.cepstral = CepstralConfig { start: 0, end: 60 };
        assert!(matches!(
            Pipeline::new(wide_cepstrum),
            Err(ConfigError::InvalidCepstralRange { start: 0, end: 60 })
        ));
        wide_cepstrum.cepstral = CepstralConfig { start: 1, end: 60 };
        assert!(matches!(
            Pipeline::new(wide_cepstrum),
            Err(ConfigError::CepstralRangeExceedsMels { end: 60, n_mels: 40 })
        ));

        let mut above_nyquist = valid;
        above_nyquist.mel.fmax = 40_000.0;
        assert!(matches!(
            Pipeline::new(above_nyquist),
            Err(ConfigError::FmaxAboveNyquist { .. })
        ));
    }

    #[test]
    fn empty_signal_is_rejected_at_construction() {
        assert!(matches!(
            AudioSignal::new(Vec::new(), 22_050),
            Err(AnalysisError::EmptySignal)
        ));
        assert!(matches!(
            AudioSignal::new(vec![0.0], 0),
            Err(AnalysisError::InvalidSampleRate)
        ));
    }
}
