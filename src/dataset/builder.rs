use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2, Axis, s};

use super::DatasetError;
use super::layout::{LabeledFile, enumerate_files};
use crate::analysis::Pipeline;
use crate::config::{ErrorPolicy, ExtractionConfig};
use crate::features::FeatureRegistry;

/// Runs the analysis pipeline and feature registry over every file of a
/// class-per-directory tree.
///
/// Construction validates the whole configuration, so a bad setting (e.g.
/// `fmax` above Nyquist) is reported before any file is touched.
#[derive(Debug)]
pub struct DatasetBuilder {
    config: ExtractionConfig,
    pipeline: Pipeline,
    registry: FeatureRegistry,
}

impl DatasetBuilder {
    /// Builder with the standard descriptor set.
    pub fn new(config: ExtractionConfig) -> Result<Self, DatasetError> {
        let pipeline_config = config.validate()?;
        let registry = FeatureRegistry::standard(&pipeline_config);
        Ok(Self {
            pipeline: Pipeline::new(pipeline_config)?,
            registry,
            config,
        })
    }

    /// Builder with a caller-supplied registry.
    pub fn with_registry(
        config: ExtractionConfig,
        registry: FeatureRegistry,
    ) -> Result<Self, DatasetError> {
        let pipeline_config = config.validate()?;
        Ok(Self {
            pipeline: Pipeline::new(pipeline_config)?,
            registry,
            config,
        })
    }

    /// Configuration the builder was created with.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Analysis pipeline shared by every worker.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Feature functions, in column order.
    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Extract one row per file under `root`.
    ///
    /// Row indices are fixed by the enumeration pass; workers then fill
    /// disjoint blocks of rows. Under [`ErrorPolicy::Abort`] a failure stops
    /// every worker before its next file, and the returned error is always
    /// the first failing file in traversal order, whatever the worker count.
    /// Under [`ErrorPolicy::Skip`] failing files are logged and their rows
    /// dropped.
    pub fn build(&self, root: &Path) -> Result<Dataset, DatasetError> {
        let started = Instant::now();
        let files = enumerate_files(root, &self.config.classes)?;
        if files.is_empty() {
            return Err(DatasetError::NoFiles {
                root: root.to_path_buf(),
            });
        }

        let n_features = self.registry.len();
        let mut matrix = Array2::zeros((files.len(), n_features + 1));
        let workers = self.config.resolved_workers().min(files.len());
        let chunk_len = files.len().div_ceil(workers);
        tracing::info!(
            "Extracting {} features from {} files with {} workers",
            n_features,
            files.len(),
            workers
        );

        let abort = AtomicBool::new(false);
        let reports: Vec<ChunkReport> = std::thread::scope(|scope| {
            let handles: Vec<_> = matrix
                .axis_chunks_iter_mut(Axis(0), chunk_len)
                .zip(files.chunks(chunk_len))
                .map(|(rows, chunk)| {
                    let abort = &abort;
                    scope.spawn(move || self.fill_rows(rows, chunk, abort))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });

        let mut failed = Vec::new();
        let mut first_error: Option<(usize, DatasetError)> = None;
        let mut unvisited: Vec<Range<usize>> = Vec::new();
        for (chunk_idx, report) in reports.into_iter().enumerate() {
            let base = chunk_idx * chunk_len;
            failed.extend(report.skipped.into_iter().map(|row| base + row));
            match report.error {
                Some((row, err)) if first_error.is_none() => first_error = Some((base + row, err)),
                Some(_) => {}
                None => unvisited.push(base + report.visited..base + report.len),
            }
        }
        if let Some((row, err)) = first_error {
            return Err(self.earliest_failure(&files, &unvisited, row, err));
        }

        let mut skipped = Vec::new();
        let (files, matrix) = if failed.is_empty() {
            (files, matrix)
        } else {
            let mut kept_rows = Vec::with_capacity(files.len() - failed.len());
            let mut kept_files = Vec::with_capacity(files.len() - failed.len());
            for (row, file) in files.into_iter().enumerate() {
                if failed.binary_search(&row).is_ok() {
                    skipped.push(file.path);
                } else {
                    kept_rows.push(row);
                    kept_files.push(file);
                }
            }
            (kept_files, matrix.select(Axis(0), &kept_rows))
        };

        let dataset = Dataset {
            feature_names: self.registry.names().map(str::to_string).collect(),
            classes: self.config.classes.clone(),
            files,
            matrix,
            skipped,
        };
        tracing::info!(
            "Extracted {} rows x {} features across {} classes in {:.2}s ({} skipped)",
            dataset.n_rows(),
            dataset.n_features(),
            dataset.classes.len(),
            started.elapsed().as_secs_f64(),
            dataset.skipped.len()
        );
        Ok(dataset)
    }

    /// Fill `rows` from `files` until done or until `abort` is raised.
    fn fill_rows(
        &self,
        mut rows: ArrayViewMut2<'_, f64>,
        files: &[LabeledFile],
        abort: &AtomicBool,
    ) -> ChunkReport {
        let n_features = self.registry.len();
        let mut values = vec![0.0; n_features];
        let mut report = ChunkReport {
            len: files.len(),
            ..ChunkReport::default()
        };
        for (idx, file) in files.iter().enumerate() {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            report.visited = idx + 1;
            let reps = match self.pipeline.analyze_path(&file.path) {
                Ok(reps) => reps,
                Err(source) => match self.config.on_error {
                    ErrorPolicy::Abort => {
                        abort.store(true, Ordering::Relaxed);
                        let err = DatasetError::File {
                            path: file.path.clone(),
                            source,
                        };
                        report.error = Some((idx, err));
                        return report;
                    }
                    ErrorPolicy::Skip => {
                        tracing::warn!("Skipping {}: {source}", file.path.display());
                        report.skipped.push(idx);
                        continue;
                    }
                },
            };
            self.registry.extract_into(&reps, &mut values);
            let mut row = rows.row_mut(idx);
            for (cell, &value) in row.iter_mut().zip(&values) {
                *cell = value;
            }
            row[n_features] = file.label as f64;
            tracing::debug!(
                "Row {idx}: {} ({} frames)",
                file.path.display(),
                reps.n_frames()
            );
        }
        report
    }

    /// Check files ahead of `row` that no worker reached before the abort.
    fn earliest_failure(
        &self,
        files: &[LabeledFile],
        unvisited: &[Range<usize>],
        row: usize,
        err: DatasetError,
    ) -> DatasetError {
        let earlier = unvisited
            .iter()
            .flat_map(|range| range.clone())
            .take_while(|&candidate| candidate < row);
        for candidate in earlier {
            let path = &files[candidate].path;
            if let Err(source) = self.pipeline.analyze_path(path) {
                return DatasetError::File {
                    path: path.clone(),
                    source,
                };
            }
        }
        err
    }
}

/// What one worker did with its block of rows.
#[derive(Debug, Default)]
struct ChunkReport {
    /// Files in the block.
    len: usize,
    /// Files attempted before stopping.
    visited: usize,
    /// Local rows dropped under the skip policy.
    skipped: Vec<usize>,
    /// Local row and error of the failure that stopped the block.
    error: Option<(usize, DatasetError)>,
}

/// Feature matrix with the class label in the last column.
#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    classes: Vec<String>,
    files: Vec<LabeledFile>,
    matrix: Array2<f64>,
    skipped: Vec<PathBuf>,
}

impl Dataset {
    /// Column names, excluding the label column.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Class names; a label is an index into this list.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Source file of each row.
    pub fn files(&self) -> &[LabeledFile] {
        &self.files
    }

    /// Full `rows x (features + 1)` matrix.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Feature columns only.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![.., ..self.feature_names.len()])
    }

    /// Label column as stored in the matrix.
    pub fn label_column(&self) -> ArrayView1<'_, f64> {
        self.matrix.column(self.feature_names.len())
    }

    /// Integer label per row.
    pub fn labels(&self) -> Vec<usize> {
        self.files.iter().map(|file| file.label).collect()
    }

    /// Files dropped under the skip policy.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Number of extracted rows, skipped files excluded.
    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of feature columns, excluding the label column.
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Row count per class, in class-list order.
    pub fn class_counts(&self) -> Vec<(&str, usize)> {
        let mut counts = vec![0usize; self.classes.len()];
        for file in &self.files {
            counts[file.label] += 1;
        }
        self.classes
            .iter()
            .map(String::as_str)
            .zip(counts)
            .collect()
    }
}
