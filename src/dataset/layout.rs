use std::fs;
use std::path::{Path, PathBuf};

use super::DatasetError;

/// One audio file and the index of its class in the configured class list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFile {
    /// Path to the audio file.
    pub path: PathBuf,
    /// Position of the file's class in the class list.
    pub label: usize,
}

/// List every file under `root/<class>` for each class, in class-list order.
///
/// Files inside a class directory are collected recursively and sorted by
/// path, so the returned order (and with it the dataset row order) does not
/// depend on the platform's directory iteration. Entries whose name starts
/// with `.` are ignored.
pub fn enumerate_files(root: &Path, classes: &[String]) -> Result<Vec<LabeledFile>, DatasetError> {
    let mut out = Vec::new();
    for (label, class) in classes.iter().enumerate() {
        let dir = root.join(class);
        if !dir.is_dir() {
            return Err(DatasetError::MissingClassDir {
                class: class.clone(),
                path: dir,
            });
        }
        let mut files = Vec::new();
        collect_files_recursive(&dir, &mut files)?;
        files.sort();
        tracing::debug!("Class {class:?} (label {label}): {} files", files.len());
        out.extend(files.into_iter().map(|path| LabeledFile { path, label }));
    }
    Ok(out)
}

fn collect_files_recursive(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DatasetError> {
    let read_dir_error = |source| DatasetError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        if is_hidden(&entry.file_name()) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
