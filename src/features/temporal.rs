//! Descriptors over the normalized waveform and its windowed frames.

use super::stats::{mean, per_frame, std};
use crate::analysis::Representations;

pub(crate) fn zero_crossing_rate_mean(reps: &Representations) -> f64 {
    mean(per_frame(reps.frames.view(), |frame| {
        if frame.len() < 2 {
            return 0.0;
        }
        let crossings = frame
            .iter()
            .zip(frame.iter().skip(1))
            .filter(|&(&prev, &current)| (prev >= 0.0) != (current >= 0.0))
            .count();
        crossings as f64 / frame.len() as f64
    }))
}

pub(crate) fn rms_energy_mean(reps: &Representations) -> f64 {
    mean(frame_rms(reps))
}

pub(crate) fn rms_energy_std(reps: &Representations) -> f64 {
    std(&frame_rms(reps))
}

fn frame_rms(reps: &Representations) -> Vec<f64> {
    per_frame(reps.frames.view(), |frame| {
        if frame.is_empty() {
            return 0.0;
        }
        (frame.iter().map(|&x| x * x).sum::<f64>() / frame.len() as f64).sqrt()
    })
}
