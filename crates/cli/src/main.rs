use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};

use clap::Parser;

use image_trimmer_core::aggregation::rect_aggregator::AggregationPolicy;
use image_trimmer_core::compression::infrastructure::optipng_compressor::OptipngCompressor;
use image_trimmer_core::detection::domain::bounds_detector::DetectionAlgorithm;
use image_trimmer_core::imaging::infrastructure::image_file_decoder::ImageFileDecoder;
use image_trimmer_core::imaging::infrastructure::image_file_encoder::ImageFileEncoder;
use image_trimmer_core::pipeline::batch_report::BatchReport;
use image_trimmer_core::pipeline::progress_tracker::ProgressSink;
use image_trimmer_core::pipeline::trim_batch_use_case::{BatchMode, TrimBatchUseCase, TrimConfig};
use image_trimmer_core::shared::constants::{DEFAULT_EXTENSIONS, IMAGE_EXTENSIONS};

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_EMPTY_BATCH: i32 = 2;
const EXIT_ITEM_FAILURES: i32 = 3;

const PROGRESS_BAR_WIDTH: usize = 30;

/// Crop every image in a directory to one shared opaque bounding box.
#[derive(Parser)]
#[command(name = "image-trimmer")]
struct Cli {
    /// Directory containing the images (not searched recursively).
    directory: PathBuf,

    /// File extensions to include (comma-separated, case-insensitive).
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Bounding box algorithm: full-scan or flood-fill.
    #[arg(long, default_value = "full-scan")]
    algorithm: String,

    /// How per-image boxes combine: union or largest.
    #[arg(long, default_value = "union")]
    policy: String,

    /// Round the target to even origin and size.
    #[arg(long)]
    even: bool,

    /// Compute and report the target without writing any file.
    #[arg(long, conflicts_with = "compress")]
    dry_run: bool,

    /// Re-compress cropped PNGs with optipng.
    #[arg(long)]
    compress: bool,

    /// Worker threads (default: all cores).
    #[arg(long)]
    jobs: Option<usize>,

    /// Write the batch report as JSON to this file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long)]
    quiet: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(EXIT_ERROR);
        }
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let extensions = selected_extensions(&cli);
    let paths = collect_image_paths(&cli.directory, &extensions)?;
    if paths.is_empty() {
        log::warn!(
            "No {} files found in {}",
            extensions.join("/"),
            cli.directory.display()
        );
        return Ok(EXIT_EMPTY_BATCH);
    }
    log::info!("Found {} images in {}", paths.len(), cli.directory.display());

    let mut use_case = TrimBatchUseCase::new(
        Box::new(ImageFileDecoder::new()),
        Box::new(ImageFileEncoder::new()),
        Box::new(OptipngCompressor::new()),
        config,
    );
    if !cli.quiet {
        use_case = use_case.with_progress_sink(progress_bar());
    }

    let report = use_case.execute(&paths)?;
    log::info!("\n\n{}", report.summary_string());

    if let Some(report_path) = &cli.report {
        std::fs::write(report_path, report.to_json()?)?;
        log::info!("Report written to {}", report_path.display());
    }

    Ok(exit_code_for(&report))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.directory.is_dir() {
        return Err(format!("Input directory not found: {}", cli.directory.display()).into());
    }
    if let Some(jobs) = cli.jobs {
        if jobs == 0 {
            return Err("Jobs must be at least 1".into());
        }
    }
    if let Some(extensions) = &cli.extensions {
        if extensions.iter().all(|e| e.trim().is_empty()) {
            return Err("At least one extension is required".into());
        }
        for ext in extensions {
            let normalized = normalize_extension(ext);
            if !normalized.is_empty() && !IMAGE_EXTENSIONS.contains(&normalized.as_str()) {
                return Err(format!(
                    "Unsupported extension '{ext}', expected one of: {}",
                    IMAGE_EXTENSIONS.join(", ")
                )
                .into());
            }
        }
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<TrimConfig, Box<dyn std::error::Error>> {
    let algorithm: DetectionAlgorithm = cli.algorithm.parse()?;
    let policy: AggregationPolicy = cli.policy.parse()?;
    let mode = if cli.dry_run {
        BatchMode::DryRun
    } else if cli.compress {
        BatchMode::CropAndCompress
    } else {
        BatchMode::Crop
    };

    Ok(TrimConfig::default()
        .with_mode(mode)
        .with_algorithm(algorithm)
        .with_policy(policy)
        .with_even(cli.even)
        .with_workers(cli.jobs))
}

fn selected_extensions(cli: &Cli) -> Vec<String> {
    match &cli.extensions {
        Some(list) => list
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect(),
        None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Regular files directly inside `dir` whose extension matches, sorted by
/// path so chunking is deterministic across runs.
fn collect_image_paths(
    dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}

fn exit_code_for(report: &BatchReport) -> i32 {
    if report.has_failures() {
        EXIT_ITEM_FAILURES
    } else {
        EXIT_OK
    }
}

fn progress_bar() -> ProgressSink {
    let last_drawn: Mutex<Option<(String, usize)>> = Mutex::new(None);
    Arc::new(move |stage: &str, current: usize, total: usize| {
        let mut last_drawn = last_drawn.lock().unwrap_or_else(|e| e.into_inner());
        if !advances_bar(&mut last_drawn, stage, current) {
            return;
        }
        eprint!("\r{stage:>8} {}", render_bar(current, total, PROGRESS_BAR_WIDTH));
        if current >= total {
            eprintln!();
        }
    })
}

/// Ticks arrive from several workers, so a lower count can show up after a
/// higher one. Only counts past the last drawn one for the same stage pass.
fn advances_bar(last_drawn: &mut Option<(String, usize)>, stage: &str, current: usize) -> bool {
    if let Some((last_stage, last_current)) = last_drawn {
        if last_stage == stage && current <= *last_current {
            return false;
        }
    }
    *last_drawn = Some((stage.to_string(), current));
    true
}

/// `[#####     ] 50.00%`
fn render_bar(current: usize, total: usize, width: usize) -> String {
    let fraction = if total == 0 {
        1.0
    } else {
        (current.min(total) as f64) / total as f64
    };
    let filled = (fraction * width as f64).round() as usize;
    format!(
        "[{}{}] {:6.2}%",
        "#".repeat(filled),
        " ".repeat(width - filled),
        fraction * 100.0
    )
}
