//! Descriptors over the power spectrogram, one value per frame reduced by mean/std.

use ndarray::ArrayView1;

use super::stats::{mean, per_frame, std};
use crate::analysis::Representations;

const ROLLOFF_FRACTION: f64 = 0.85;
const FLATNESS_EPS: f64 = 1e-12;

pub(crate) fn centroid_mean(reps: &Representations) -> f64 {
    mean(centroids(reps))
}

pub(crate) fn centroid_std(reps: &Representations) -> f64 {
    std(&centroids(reps))
}

pub(crate) fn bandwidth_mean(reps: &Representations) -> f64 {
    mean(per_frame(reps.stft.view(), |power| {
        let total = power.sum();
        if total <= 0.0 {
            return 0.0;
        }
        let centroid = frame_centroid(reps, power);
        let spread = power
            .iter()
            .enumerate()
            .map(|(bin, &p)| {
                let diff = reps.bin_hz(bin) - centroid;
                diff * diff * p
            })
            .sum::<f64>();
        (spread / total).sqrt()
    }))
}

pub(crate) fn rolloff_mean(reps: &Representations) -> f64 {
    mean(per_frame(reps.stft.view(), |power| {
        let total = power.sum();
        if total <= 0.0 {
            return 0.0;
        }
        let target = total * ROLLOFF_FRACTION;
        let mut cumulative = 0.0;
        for (bin, &p) in power.iter().enumerate() {
            cumulative += p;
            if cumulative >= target {
                return reps.bin_hz(bin);
            }
        }
        reps.sample_rate as f64 / 2.0
    }))
}

pub(crate) fn flatness_mean(reps: &Representations) -> f64 {
    mean(per_frame(reps.stft.view(), |power| {
        if power.is_empty() || power.sum() <= 0.0 {
            return 0.0;
        }
        let n = power.len() as f64;
        let log_mean = power.iter().map(|&p| (p + FLATNESS_EPS).ln()).sum::<f64>() / n;
        let arith = power.iter().map(|&p| p + FLATNESS_EPS).sum::<f64>() / n;
        log_mean.exp() / arith
    }))
}

/// Mean half-wave rectified change in magnitude between consecutive frames.
pub(crate) fn flux_mean(reps: &Representations) -> f64 {
    let stft = &reps.stft;
    let fluxes = (1..stft.ncols()).map(|t| {
        stft.column(t)
            .iter()
            .zip(stft.column(t - 1))
            .map(|(&now, &before)| (now.sqrt() - before.sqrt()).max(0.0))
            .sum::<f64>()
    });
    mean(fluxes)
}

fn centroids(reps: &Representations) -> Vec<f64> {
    per_frame(reps.stft.view(), |power| frame_centroid(reps, power))
}

fn frame_centroid(reps: &Representations, power: ArrayView1<'_, f64>) -> f64 {
    let total = power.sum();
    if total <= 0.0 {
        return 0.0;
    }
    power
        .iter()
        .enumerate()
        .map(|(bin, &p)| reps.bin_hz(bin) * p)
        .sum::<f64>()
        / total
}
