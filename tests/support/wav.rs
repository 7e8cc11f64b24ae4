use std::f32::consts::PI;
use std::path::Path;

/// Write mono float samples as a 32-bit float WAV, creating parent directories.
pub fn write_test_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create wav parent dirs");
    }
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav writer");
    for &sample in samples {
        writer.write_sample(sample).expect("write wav sample");
    }
    writer.finalize().expect("finalize wav");
}

/// `seconds` of a sine at `freq` Hz with a little second harmonic.
pub fn tone(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let len = (seconds * sample_rate as f32) as usize;
    (0..len)
        .map(|n| {
            let t = n as f32 / sample_rate as f32;
            0.5 * (2.0 * PI * freq * t).sin() + 0.2 * (4.0 * PI * freq * t).sin()
        })
        .collect()
}

/// Write a class tree under `root`: `layout[i] = (class, file_count)`.
///
/// Every file gets a distinct tone so rows differ.
pub fn write_class_tree(root: &Path, layout: &[(&str, usize)], sample_rate: u32) {
    let mut freq = 220.0;
    for (class, count) in layout {
        std::fs::create_dir_all(root.join(class)).expect("create class dir");
        for idx in 0..*count {
            let path = root.join(class).join(format!("track_{idx:02}.wav"));
            write_test_wav(&path, &tone(freq, 0.5, sample_rate), sample_rate);
            freq *= 1.25;
        }
    }
}
