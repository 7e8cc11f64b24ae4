use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
    io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use thiserror::Error;

/// Errors raised while reading an audio file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("Open {path}: {source}")]
    Open {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The container format was not recognized.
    #[error("Probe failed for {path}: {source}")]
    Probe {
        /// File path.
        path: PathBuf,
        /// Symphonia error.
        source: Error,
    },
    /// The container has no decodable track, or the track lacks rate/channel info.
    #[error("No usable audio track in {path}: {reason}")]
    Track {
        /// File path.
        path: PathBuf,
        /// What was missing.
        reason: &'static str,
    },
    /// Packet read or decode failure.
    #[error("Decode failed for {path}: {source}")]
    Decode {
        /// File path.
        path: PathBuf,
        /// Symphonia error.
        source: Error,
    },
    /// Decoding finished without producing any samples.
    #[error("Decoded 0 samples from {path}")]
    Empty {
        /// File path.
        path: PathBuf,
    },
}

/// Raw decoded audio in interleaved `f32` samples.
pub(crate) struct DecodedAudio {
    pub(crate) samples: Vec<f32>,
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
}

/// Mono `f64` samples at the file's native rate.
pub(crate) struct MonoAudio {
    pub(crate) samples: Vec<f64>,
    pub(crate) sample_rate: u32,
}

impl DecodedAudio {
    /// Average interleaved channels into one, zeroing non-finite samples.
    pub(crate) fn into_mono(self) -> MonoAudio {
        let channels = self.channels.max(1) as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| {
                frame.iter().map(|&s| sanitize_sample(s)).sum::<f64>() / channels as f64
            })
            .collect();
        MonoAudio {
            samples,
            sample_rate: self.sample_rate,
        }
    }
}

fn sanitize_sample(sample: f32) -> f64 {
    if sample.is_finite() {
        sample as f64
    } else {
        0.0
    }
}

/// Decode a file into interleaved `f32` samples with sample rate and channel count.
pub(crate) fn decode_audio(path: &Path) -> Result<DecodedAudio, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|source| LoadError::Probe {
            path: path.to_path_buf(),
            source,
        })?;
    let mut format = probed.format;
    let track = format.default_track().ok_or_else(|| LoadError::Track {
        path: path.to_path_buf(),
        reason: "no default track",
    })?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .filter(|&rate| rate > 0)
        .ok_or_else(|| LoadError::Track {
            path: path.to_path_buf(),
            reason: "missing sample rate",
        })?;
    let channels = codec_params
        .channels
        .ok_or_else(|| LoadError::Track {
            path: path.to_path_buf(),
            reason: "missing channel count",
        })?
        .count() as u16;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(err) if is_end_of_stream(&err) => break,
            Err(source) => {
                return Err(LoadError::Decode {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        // A corrupt packet fails the whole file rather than yielding truncated audio.
        let audio_buf = decoder.decode(&packet).map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let spec = *audio_buf.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: channels.max(1),
    })
}

/// Readers signal the end of the stream with an IO error.
fn is_end_of_stream(err: &Error) -> bool {
    matches!(err, Error::IoError(_))
}
