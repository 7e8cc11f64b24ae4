//! Labeled feature matrices built from a class-per-directory audio tree.
#![deny(missing_docs)]

mod builder;
pub mod export;
/// Class directory discovery and file ordering.
pub mod layout;

use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::config::ConfigError;

pub use builder::{Dataset, DatasetBuilder};
pub use export::{ExportSummary, export_dataset};
pub use layout::{LabeledFile, enumerate_files};

/// Errors raised while building or exporting a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Configuration failed validation; no file was read.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A configured class has no directory under the root.
    #[error("Class {class:?} has no directory at {path}")]
    MissingClassDir {
        /// Class name from the configuration.
        class: String,
        /// Expected directory.
        path: PathBuf,
    },
    /// A directory could not be listed.
    #[error("Read dir {path}: {source}")]
    ReadDir {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// One file failed to decode or analyze.
    #[error("Extraction failed for {path}: {source}")]
    File {
        /// Offending file.
        path: PathBuf,
        /// Underlying analysis error.
        source: AnalysisError,
    },
    /// The class directories contain no files at all.
    #[error("No audio files found under {root}")]
    NoFiles {
        /// Dataset root.
        root: PathBuf,
    },
    /// Creating or writing an output file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The manifest could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
