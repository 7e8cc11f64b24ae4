//! Named scalar descriptors over a file's [`Representations`].
//!
//! A [`FeatureRegistry`] holds feature functions keyed by name and always
//! evaluates them in lexicographic name order; that order is the column
//! order of every feature vector and of the exported dataset. Adding a
//! descriptor only means registering one more function.

mod spectral;
mod stats;
mod temporal;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::analysis::Representations;
use crate::analysis::chroma::N_CHROMA;
use crate::config::PipelineConfig;

/// A pure reduction from a file's representations to one scalar.
///
/// Implementations must be deterministic and side-effect free, and must
/// return a finite value for any well-formed input, choosing their own
/// fallback for degenerate (e.g. silent) audio. The registry does not
/// validate results.
pub trait FeatureFunction: Send + Sync {
    /// Reduce `reps` to a scalar.
    fn compute(&self, reps: &Representations) -> f64;
}

impl<F> FeatureFunction for F
where
    F: Fn(&Representations) -> f64 + Send + Sync,
{
    fn compute(&self, reps: &Representations) -> f64 {
        self(reps)
    }
}

/// Errors raised while registering feature functions.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is already taken.
    #[error("feature {0:?} is already registered")]
    Duplicate(String),
}

/// Ordered name-to-function table, built once at startup.
#[derive(Default)]
pub struct FeatureRegistry {
    functions: BTreeMap<String, Box<dyn FeatureFunction>>,
}

impl fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("names", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FeatureRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the standard descriptor set for `config`.
    ///
    /// MFCC descriptors are named after the absolute coefficient index, so the
    /// set depends on the configured cepstral range.
    pub fn standard(config: &PipelineConfig) -> Self {
        let mut registry = Self::new();
        for (name, function) in standard_functions(config) {
            // Standard names are unique by construction.
            registry.functions.insert(name, function);
        }
        registry
    }

    /// Add a named function. Names must be unique.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> Result<(), RegistryError>
    where
        F: FeatureFunction + 'static,
    {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.functions.insert(name, Box::new(function));
        Ok(())
    }

    /// Number of registered features.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Feature names in evaluation (lexicographic) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Evaluate every function, in name order, into `out`.
    ///
    /// `out` must hold exactly [`FeatureRegistry::len`] values.
    pub fn extract_into(&self, reps: &Representations, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.functions.len());
        for (slot, function) in out.iter_mut().zip(self.functions.values()) {
            *slot = function.compute(reps);
        }
    }

    /// Evaluate every function into a named vector.
    pub fn extract(&self, reps: &Representations) -> FeatureVector {
        let mut values = vec![0.0; self.functions.len()];
        self.extract_into(reps, &mut values);
        FeatureVector {
            names: self.names().map(str::to_string).collect(),
            values,
        }
    }
}

/// One file's descriptors, ordered by feature name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Feature names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in column order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .binary_search_by(|candidate| candidate.as_str().cmp(name))
            .ok()
            .map(|idx| self.values[idx])
    }

    /// `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a vector from an empty registry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type NamedFunction = (String, Box<dyn FeatureFunction>);

fn named<F>(name: impl Into<String>, function: F) -> NamedFunction
where
    F: FeatureFunction + 'static,
{
    (name.into(), Box::new(function))
}

fn standard_functions(config: &PipelineConfig) -> Vec<NamedFunction> {
    let mut out = vec![
        named("mel_log_energy_mean", |reps: &Representations| {
            stats::mean(reps.mel_log.iter().copied())
        }),
        named("rms_energy_mean", temporal::rms_energy_mean),
        named("rms_energy_std", temporal::rms_energy_std),
        named("spectral_bandwidth_mean", spectral::bandwidth_mean),
        named("spectral_centroid_mean", spectral::centroid_mean),
        named("spectral_centroid_std", spectral::centroid_std),
        named("spectral_flatness_mean", spectral::flatness_mean),
        named("spectral_flux_mean", spectral::flux_mean),
        named("spectral_rolloff_mean", spectral::rolloff_mean),
        named("zero_crossing_rate_mean", temporal::zero_crossing_rate_mean),
    ];

    let cepstral = config.cepstral;
    let width = index_width(cepstral.end.saturating_sub(1));
    for row in 0..cepstral.len() {
        let coefficient = cepstral.start + row;
        out.push(named(
            format!("mfcc_{coefficient:0width$}_mean"),
            move |reps: &Representations| stats::row_mean(reps.mfcc.view(), row),
        ));
        out.push(named(
            format!("mfcc_{coefficient:0width$}_std"),
            move |reps: &Representations| stats::row_std(reps.mfcc.view(), row),
        ));
    }

    for pitch_class in 0..N_CHROMA {
        out.push(named(
            format!("chroma_{pitch_class:02}_mean"),
            move |reps: &Representations| stats::row_mean(reps.chroma.view(), pitch_class),
        ));
    }
    out
}

/// Zero-padding width that keeps numbered names in numeric order when sorted.
fn index_width(max_index: usize) -> usize {
    max_index.to_string().len().max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AudioSignal, Pipeline};
    use crate::config::ExtractionConfig;
    use std::f64::consts::PI;

    fn reps_for(samples: Vec<f64>) -> (FeatureRegistry, Representations) {
        let config = ExtractionConfig::default().pipeline_config().unwrap();
        let pipeline = Pipeline::new(config).unwrap();
        let signal = AudioSignal::new(samples, config.sample_rate).unwrap();
        (FeatureRegistry::standard(&config), pipeline.analyze(&signal).unwrap())
    }

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f64 / 22_050.0).sin())
            .collect()
    }

    #[test]
    fn standard_names_are_sorted_and_complete() {
        let config = ExtractionConfig::default().pipeline_config().unwrap();
        let registry = FeatureRegistry::standard(&config);
        let names: Vec<&str> = registry.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(registry.len(), 10 + 2 * 12 + 12);
        assert_eq!(names.first(), Some(&"chroma_00_mean"));
        assert!(names.contains(&"mfcc_01_mean"));
        assert!(names.contains(&"mfcc_12_std"));
        assert!(!names.contains(&"mfcc_00_mean"));
    }

    #[test]
    fn wide_cepstral_ranges_keep_numeric_order() {
        let config = ExtractionConfig {
            n_mels: 128,
            cep_start: 95,
            cep_end: 105,
            ..ExtractionConfig::default()
        }
        .pipeline_config()
        .unwrap();
        let registry = FeatureRegistry::standard(&config);
        let mfcc: Vec<&str> = registry.names().filter(|n| n.starts_with("mfcc_")).collect();
        assert_eq!(mfcc.first(), Some(&"mfcc_095_mean"));
        assert_eq!(mfcc.last(), Some(&"mfcc_104_std"));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = FeatureRegistry::new();
        registry.register("one", |_: &Representations| 1.0).unwrap();
        let err = registry
            .register("one", |_: &Representations| 2.0)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "one"));
    }

    #[test]
    fn custom_functions_run_in_name_order() {
        let mut registry = FeatureRegistry::new();
        registry
            .register("zeta", |reps: &Representations| reps.n_frames() as f64)
            .unwrap();
        registry
            .register("alpha", |reps: &Representations| reps.sample_rate as f64)
            .unwrap();
        let (_, reps) = reps_for(sine(440.0, 5000));
        let vector = registry.extract(&reps);
        assert_eq!(vector.names(), ["alpha".to_string(), "zeta".to_string()]);
        assert_eq!(vector.values(), [22_050.0, 7.0]);
        assert_eq!(vector.get("zeta"), Some(7.0));
        assert_eq!(vector.get("missing"), None);
    }

    #[test]
    fn sine_centroid_tracks_frequency() {
        let (registry, reps) = reps_for(sine(1_000.0, 22_050));
        let vector = registry.extract(&reps);
        let centroid = vector.get("spectral_centroid_mean").unwrap();
        assert!(centroid > 900.0 && centroid < 1_100.0, "centroid {centroid}");
        assert!(vector.get("spectral_flatness_mean").unwrap() < 0.1);
        let chroma_b = vector.get("chroma_11_mean").unwrap();
        let chroma_f = vector.get("chroma_05_mean").unwrap();
        // 1 kHz sits between B5 and C6, far from F.
        assert!(chroma_b > chroma_f);
    }

    #[test]
    fn silent_input_yields_finite_values() {
        let (registry, reps) = reps_for(vec![0.0; 8192]);
        let vector = registry.extract(&reps);
        for (name, value) in vector.iter() {
            assert!(value.is_finite(), "{name} = {value}");
        }
        assert_eq!(vector.get("spectral_centroid_mean"), Some(0.0));
        assert_eq!(vector.get("zero_crossing_rate_mean"), Some(0.0));
    }

    #[test]
    fn column_order_is_stable_across_builds() {
        let config = ExtractionConfig::default().pipeline_config().unwrap();
        let a: Vec<String> = FeatureRegistry::standard(&config)
            .names()
            .map(str::to_string)
            .collect();
        let b: Vec<String> = FeatureRegistry::standard(&config)
            .names()
            .map(str::to_string)
            .collect();
        assert_eq!(a, b);
    }
}
