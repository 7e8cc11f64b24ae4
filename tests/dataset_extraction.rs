mod support;

use std::fs;

use genre_features::analysis::AnalysisError;
use genre_features::config::{ErrorPolicy, ExtractionConfig};
use genre_features::dataset::{DatasetBuilder, DatasetError, export_dataset};
use support::wav::{tone, write_class_tree, write_test_wav};
use tempfile::TempDir;

const SR: u32 = 22_050;

fn config(classes: &[&str], workers: usize) -> ExtractionConfig {
    ExtractionConfig {
        classes: classes.iter().map(|c| c.to_string()).collect(),
        workers: Some(workers),
        ..ExtractionConfig::default()
    }
}

#[test]
fn three_class_tree_yields_one_labeled_row_per_file() {
    let dir = TempDir::new().unwrap();
    write_class_tree(dir.path(), &[("blues", 2), ("metal", 3), ("pop", 1)], SR);

    let builder = DatasetBuilder::new(config(&["blues", "metal", "pop"], 2)).unwrap();
    let dataset = builder.build(dir.path()).unwrap();

    assert_eq!(dataset.n_rows(), 6);
    assert_eq!(dataset.labels(), vec![0, 0, 1, 1, 1, 2]);
    assert_eq!(
        dataset.label_column().to_vec(),
        vec![0.0, 0.0, 1.0, 1.0, 1.0, 2.0]
    );
    assert_eq!(dataset.n_features(), builder.registry().len());
    assert_eq!(dataset.matrix().ncols(), builder.registry().len() + 1);
    assert!(dataset.features().iter().all(|v| v.is_finite()));
    assert_eq!(
        dataset.class_counts(),
        vec![("blues", 2), ("metal", 3), ("pop", 1)]
    );
}

#[test]
fn fmax_above_nyquist_fails_before_any_file_is_read() {
    let mut config = config(&["blues"], 1);
    config.fmax = Some(SR as f64);
    // The root does not exist; validation must fail first.
    let err = DatasetBuilder::new(config).unwrap_err();
    assert!(matches!(err, DatasetError::Config(_)), "{err}");
}

#[test]
fn worker_count_does_not_change_the_matrix() {
    let dir = TempDir::new().unwrap();
    write_class_tree(dir.path(), &[("a", 3), ("b", 4)], SR);

    let sequential = DatasetBuilder::new(config(&["a", "b"], 1))
        .unwrap()
        .build(dir.path())
        .unwrap();
    let parallel = DatasetBuilder::new(config(&["a", "b"], 3))
        .unwrap()
        .build(dir.path())
        .unwrap();
    assert_eq!(sequential.feature_names(), parallel.feature_names());
    assert_eq!(sequential.files(), parallel.files());
    assert_eq!(sequential.matrix(), parallel.matrix());
}

#[test]
fn corrupt_file_aborts_the_run_by_default() {
    let dir = TempDir::new().unwrap();
    write_class_tree(dir.path(), &[("a", 2), ("b", 2)], SR);
    fs::write(dir.path().join("b/broken.wav"), b"not audio at all").unwrap();

    let err = DatasetBuilder::new(config(&["a", "b"], 2))
        .unwrap()
        .build(dir.path())
        .unwrap_err();
    match err {
        DatasetError::File { path, .. } => assert!(path.ends_with("broken.wav")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn abort_reports_the_first_failing_file_in_traversal_order() {
    let dir = TempDir::new().unwrap();
    write_class_tree(dir.path(), &[("a", 6), ("b", 6)], SR);
    // Row 6 closes the first worker's block; row 7 opens the second and fails at once.
    fs::write(dir.path().join("a/z_broken.wav"), b"not audio at all").unwrap();
    fs::write(dir.path().join("b/a_broken.wav"), b"not audio at all").unwrap();

    for workers in [1, 2, 4] {
        let err = DatasetBuilder::new(config(&["a", "b"], workers))
            .unwrap()
            .build(dir.path())
            .unwrap_err();
        match err {
            DatasetError::File { path, .. } => {
                assert!(path.ends_with("a/z_broken.wav"), "{workers} workers: {path:?}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn skip_policy_drops_failing_files() {
    let dir = TempDir::new().unwrap();
    write_class_tree(dir.path(), &[("a", 2), ("b", 3), ("c", 1)], SR);
    fs::write(dir.path().join("b/broken.wav"), b"not audio at all").unwrap();

    let mut config = config(&["a", "b", "c"], 2);
    config.on_error = ErrorPolicy::Skip;
    let dataset = DatasetBuilder::new(config).unwrap().build(dir.path()).unwrap();

    assert_eq!(dataset.n_rows(), 6);
    assert_eq!(dataset.labels(), vec![0, 0, 1, 1, 1, 2]);
    assert_eq!(dataset.skipped().len(), 1);
    assert!(dataset.skipped()[0].ends_with("broken.wav"));
    assert!(dataset.files().iter().all(|f| !f.path.ends_with("broken.wav")));
}

#[test]
fn too_short_file_reports_insufficient_samples() {
    let dir = TempDir::new().unwrap();
    write_test_wav(&dir.path().join("a/short.wav"), &tone(440.0, 0.01, SR), SR);

    let err = DatasetBuilder::new(config(&["a"], 1))
        .unwrap()
        .build(dir.path())
        .unwrap_err();
    assert!(matches!(
        err,
        DatasetError::File {
            source: AnalysisError::InsufficientSamples { required: 1536, .. },
            ..
        }
    ));
}

#[test]
fn files_at_other_rates_are_resampled() {
    let dir = TempDir::new().unwrap();
    write_test_wav(&dir.path().join("a/hi.wav"), &tone(440.0, 0.5, 44_100), 44_100);
    write_test_wav(&dir.path().join("a/lo.wav"), &tone(440.0, 0.5, SR), SR);

    let dataset = DatasetBuilder::new(config(&["a"], 1))
        .unwrap()
        .build(dir.path())
        .unwrap();
    assert_eq!(dataset.n_rows(), 2);
    let centroid = dataset
        .feature_names()
        .iter()
        .position(|name| name == "spectral_centroid_mean")
        .unwrap();
    let hi = dataset.matrix()[[0, centroid]];
    let lo = dataset.matrix()[[1, centroid]];
    assert!((hi - lo).abs() / lo < 0.05, "hi {hi} lo {lo}");
}

#[test]
fn empty_tree_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    let err = DatasetBuilder::new(config(&["a"], 1))
        .unwrap()
        .build(dir.path())
        .unwrap_err();
    assert!(matches!(err, DatasetError::NoFiles { .. }));
}

#[test]
fn export_writes_csv_and_manifest() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("music");
    let out = dir.path().join("out");
    write_class_tree(&root, &[("x", 2), ("y", 1)], SR);

    let builder = DatasetBuilder::new(config(&["x", "y"], 2)).unwrap();
    let dataset = builder.build(&root).unwrap();
    let summary = export_dataset(&dataset, builder.config(), &out).unwrap();
    assert_eq!(summary.rows, 3);

    let csv = fs::read_to_string(&summary.csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    let header: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(header.last(), Some(&"CLASS"));
    assert_eq!(header.len(), dataset.n_features() + 1);
    assert_eq!(&header[..header.len() - 1], dataset.feature_names());
    let labels: Vec<&str> = lines[1..]
        .iter()
        .map(|line| line.rsplit(',').next().unwrap())
        .collect();
    assert_eq!(labels, vec!["0", "0", "1"]);
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), header.len());
        for value in &fields[..fields.len() - 1] {
            assert!(value.parse::<f64>().unwrap().is_finite());
        }
    }

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary.manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["rows"], 3);
    assert_eq!(manifest["label_column"], "CLASS");
    assert_eq!(manifest["classes"], serde_json::json!(["x", "y"]));
    assert_eq!(manifest["class_counts"]["x"], 2);
    assert_eq!(manifest["config"]["n_mels"], 40);
    assert_eq!(
        manifest["feature_names"].as_array().unwrap().len(),
        dataset.n_features()
    );
}
