//! Extract a labeled feature table from a class-per-directory audio tree.

use std::path::PathBuf;

use genre_features::config::{ErrorPolicy, ExtractionConfig, WindowKind};
use genre_features::dataset::{DatasetBuilder, export_dataset};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    root: PathBuf,
    out_dir: PathBuf,
    config_path: Option<PathBuf>,
    classes: Option<Vec<String>>,
    workers: Option<usize>,
    window: Option<WindowKind>,
    skip_errors: bool,
    log_dir: Option<PathBuf>,
}

impl Options {
    fn resolved_config(&self) -> Result<ExtractionConfig, String> {
        let mut config = match &self.config_path {
            Some(path) => ExtractionConfig::load(path).map_err(|err| err.to_string())?,
            None => ExtractionConfig::default(),
        };
        if let Some(classes) = &self.classes {
            config.classes = classes.clone();
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if let Some(window) = self.window {
            config.window = window;
        }
        if self.skip_errors {
            config.on_error = ErrorPolicy::Skip;
        }
        Ok(config)
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let config = options.resolved_config()?;
    let builder = DatasetBuilder::new(config).map_err(|err| err.to_string())?;

    let log_dir = options
        .log_dir
        .clone()
        .unwrap_or_else(|| options.out_dir.join("logs"));
    if let Err(err) = genre_features::logging::init(&log_dir) {
        eprintln!("Logging disabled: {err}");
    }

    let dataset = builder.build(&options.root).map_err(|err| err.to_string())?;
    let summary =
        export_dataset(&dataset, builder.config(), &options.out_dir).map_err(|err| err.to_string())?;

    println!(
        "Extracted {} rows x {} features into {}",
        summary.rows,
        dataset.n_features(),
        summary.csv_path.display()
    );
    println!("Per-class counts:");
    for (class, count) in dataset.class_counts() {
        println!("  {class}: {count}");
    }
    if !dataset.skipped().is_empty() {
        println!("Skipped {} files:", dataset.skipped().len());
        for path in dataset.skipped() {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut root = None;
    let mut out_dir = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--root" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--root requires a value".to_string())?;
                root = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out_dir = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--classes" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--classes requires a value".to_string())?;
                let classes: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|class| !class.is_empty())
                    .map(str::to_string)
                    .collect();
                if classes.is_empty() {
                    return Err(format!("Invalid --classes value: {value}"));
                }
                options.classes = Some(classes);
            }
            "--workers" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--workers requires a value".to_string())?;
                let workers = value
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("Invalid --workers value: {value}"))?;
                options.workers = Some(workers);
            }
            "--window" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--window requires a value".to_string())?;
                let window = WindowKind::parse(value)
                    .ok_or_else(|| format!("Invalid --window value: {value}"))?;
                options.window = Some(window);
            }
            "--skip-errors" => {
                options.skip_errors = true;
            }
            "--log-dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--log-dir requires a value".to_string())?;
                options.log_dir = Some(PathBuf::from(value));
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }

    options.root = root.ok_or_else(|| "--root is required".to_string())?;
    options.out_dir = out_dir.ok_or_else(|| "--out is required".to_string())?;
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "genre-extract",
        "",
        "Extracts audio descriptors for every file under <root>/<class>/ into a labeled table.",
        "",
        "Usage:",
        "  genre-extract --root <dir> --out <dir> [options]",
        "",
        "Options:",
        "  --root <dir>          Dataset root with one subdirectory per class (required).",
        "  --out <dir>           Output directory for dataset.csv and manifest.json (required).",
        "  --config <path>       TOML extraction config (defaults apply to missing keys).",
        "  --classes <a,b,...>   Ordered class list; overrides the config.",
        "  --workers <usize>     Worker threads (default: available parallelism).",
        "  --window <name>       hann, hamming, blackman or rectangular; overrides the config.",
        "  --skip-errors         Log and drop unreadable files instead of aborting.",
        "  --log-dir <dir>       Log file directory (default: <out>/logs).",
    ]
    .join("\n")
}
