//! Audio feature extraction for genre classification datasets.
//!
//! Each file runs through normalization, framing, a power STFT and the mel,
//! MFCC and chroma projections ([`analysis`]). A [`features::FeatureRegistry`]
//! reduces those representations to named scalars, and the [`dataset`]
//! builder turns a class-per-directory tree into a labeled matrix.

/// Signal-processing stages from decoded audio to spectral representations.
pub mod analysis;
/// Extraction settings and their eager validation.
pub mod config;
/// Labeled dataset construction and export.
pub mod dataset;
/// Named scalar descriptors.
pub mod features;
/// Global tracing setup for the command-line tools.
pub mod logging;

pub use analysis::{AnalysisError, AudioSignal, Pipeline, Representations};
pub use config::{ConfigError, ErrorPolicy, ExtractionConfig, PipelineConfig, WindowKind};
pub use dataset::{Dataset, DatasetBuilder, DatasetError};
pub use features::{FeatureFunction, FeatureRegistry, FeatureVector, RegistryError};
