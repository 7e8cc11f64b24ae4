//! Persist a [`Dataset`] as CSV plus a JSON manifest for training tools.

use std::borrow::Cow;
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{Dataset, DatasetError};
use crate::config::ExtractionConfig;

const DATASET_FORMAT_VERSION: i64 = 1;
const CSV_FILE_NAME: &str = "dataset.csv";
const MANIFEST_FILE_NAME: &str = "manifest.json";
/// Header of the trailing label column.
pub const LABEL_COLUMN: &str = "CLASS";

/// Where an export landed.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Written CSV table.
    pub csv_path: PathBuf,
    /// Written manifest.
    pub manifest_path: PathBuf,
    /// Data rows in the CSV.
    pub rows: usize,
}

impl Dataset {
    /// Write the matrix as CSV: sorted feature names then `CLASS`, one row per file.
    ///
    /// Labels are written as integers; feature values use the shortest
    /// representation that round-trips.
    pub fn write_csv<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut writer = BufWriter::new(writer);
        let header: Vec<Cow<'_, str>> = self
            .feature_names()
            .iter()
            .map(|name| csv_field(name))
            .chain(std::iter::once(Cow::Borrowed(LABEL_COLUMN)))
            .collect();
        writeln!(writer, "{}", header.join(","))?;

        let n_features = self.n_features();
        for (row, label) in self.matrix().rows().into_iter().zip(self.labels()) {
            for value in row.iter().take(n_features) {
                write!(writer, "{value},")?;
            }
            writeln!(writer, "{label}")?;
        }
        writer.flush()
    }
}

/// Write `dataset.csv` and `manifest.json` into `out_dir`, creating it if needed.
pub fn export_dataset(
    dataset: &Dataset,
    config: &ExtractionConfig,
    out_dir: &Path,
) -> Result<ExportSummary, DatasetError> {
    create_dir_all(out_dir)?;

    let csv_path = out_dir.join(CSV_FILE_NAME);
    dataset.write_csv(File::create(&csv_path)?)?;

    let class_counts: serde_json::Map<String, serde_json::Value> = dataset
        .class_counts()
        .into_iter()
        .map(|(class, count)| (class.to_string(), count.into()))
        .collect();
    let files: Vec<serde_json::Value> = dataset
        .files()
        .iter()
        .map(|file| {
            serde_json::json!({
                "path": file.path.display().to_string(),
                "label": file.label,
            })
        })
        .collect();
    let skipped: Vec<String> = dataset
        .skipped()
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    let manifest = serde_json::json!({
        "format_version": DATASET_FORMAT_VERSION,
        "feature_names": dataset.feature_names(),
        "label_column": LABEL_COLUMN,
        "classes": dataset.classes(),
        "rows": dataset.n_rows(),
        "class_counts": class_counts,
        "config": config,
        "files": files,
        "skipped": skipped,
        "outputs": {
            "table": CSV_FILE_NAME,
        }
    });

    let manifest_path = out_dir.join(MANIFEST_FILE_NAME);
    let mut manifest_writer = BufWriter::new(File::create(&manifest_path)?);
    serde_json::to_writer_pretty(&mut manifest_writer, &manifest)?;
    manifest_writer.flush()?;

    tracing::info!(
        "Wrote {} rows to {} and manifest to {}",
        dataset.n_rows(),
        csv_path.display(),
        manifest_path.display()
    );
    Ok(ExportSummary {
        csv_path,
        manifest_path,
        rows: dataset.n_rows(),
    })
}

/// Quote a header field when it contains a separator, quote or newline.
fn csv_field(name: &str) -> Cow<'_, str> {
    if name.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(name)
    }
}
