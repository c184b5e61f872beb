use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use subject_crop_core::cropping::domain::crop_policy::{CropPolicy, NoSubjectFallback};
use subject_crop_core::cropping::domain::focus_mode::FocusMode;
use subject_crop_core::detection::domain::subject_detector::SubjectDetector;
use subject_crop_core::detection::domain::subject_selector::SelectionPolicy;
use subject_crop_core::detection::infrastructure::detector_pool::DetectorPool;
use subject_crop_core::detection::infrastructure::model_resolver::{self, ModelSource};
use subject_crop_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CONFIDENCE,
};
use subject_crop_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use subject_crop_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use subject_crop_core::pipeline::batch_crop_use_case::BatchCropUseCase;
use subject_crop_core::pipeline::batch_executor::BatchJob;
use subject_crop_core::pipeline::batch_report::BatchReport;
use subject_crop_core::pipeline::crop_engine::CropEngine;
use subject_crop_core::pipeline::crop_image_use_case::CropImageUseCase;
use subject_crop_core::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
use subject_crop_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use subject_crop_core::shared::constants::YOLO_MODEL_NAME;
use subject_crop_core::shared::image_files::{is_image, list_images, output_file_name};

/// Subject-centered catalog cropping for product photos.
#[derive(Parser)]
#[command(name = "subject-crop")]
struct Cli {
    /// Input image file, or a directory of images.
    input: PathBuf,

    /// Output file or directory (required unless --dry-run is used).
    output: Option<PathBuf>,

    /// Vertical bias: full, upper or lower.
    #[arg(long, default_value = "full")]
    focus: FocusMode,

    /// Minimum person confidence (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Margin added around the subject as a fraction of its height (0.0-1.0).
    #[arg(long)]
    padding: Option<f64>,

    /// Border trim tolerance (0-255).
    #[arg(long)]
    tolerance: Option<u8>,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Fraction trimmed from every edge before the final fit (0.0-0.5).
    #[arg(long)]
    bleed: Option<f64>,

    /// Subject selection: person (highest confidence) or largest (any class).
    #[arg(long)]
    selection: Option<SelectionPolicy>,

    /// When no subject is found: skip or full-image.
    #[arg(long)]
    fallback: Option<NoSubjectFallback>,

    /// JSON crop policy file (defaults to the platform config file if present).
    #[arg(long)]
    policy: Option<PathBuf>,

    /// ONNX detector model file.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Download URL used when the model is not cached.
    #[arg(long)]
    model_url: Option<String>,

    /// Worker threads for directory input (default: min(cores, 4)).
    #[arg(long)]
    workers: Option<usize>,

    /// Independent detector instances shared by the workers.
    #[arg(long, default_value = "1")]
    detectors: usize,

    /// Write a JSON report of every processed image.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Compute crop boxes without writing any images.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let policy = build_policy(&cli)?;
    let detectors = Arc::new(build_detectors(&cli, &policy)?);
    let engine = Arc::new(CropEngine::new(detectors, policy));
    let use_case = Arc::new(CropImageUseCase::new(
        Arc::new(ImageFileReader::new()),
        Arc::new(ImageFileWriter::new()),
        engine,
        cli.focus,
    ));

    let report = if cli.input.is_dir() {
        run_batch(&cli, use_case)?
    } else {
        run_single(&cli, &use_case)
    };

    if let Some(path) = &cli.report {
        report.write_json(path)?;
        log::info!("Report written to {}", path.display());
    }
    if report.all_failed() {
        return Err(format!("All {} images failed", report.total()).into());
    }
    Ok(())
}

fn run_single(cli: &Cli, use_case: &CropImageUseCase) -> BatchReport {
    let output = if cli.dry_run {
        None
    } else {
        cli.output
            .as_deref()
            .map(|out| resolve_single_output(&cli.input, out))
    };

    let result = use_case.execute(&cli.input, output.as_deref());
    match &result {
        Ok(outcome) => match &outcome.written {
            Some(path) => log::info!("Output written to {}", path.display()),
            None => match outcome.plan.crop_box() {
                Some(bbox) => log::info!("Crop box for {}: {bbox}", cli.input.display()),
                None => log::info!("{}: no subject, full image", cli.input.display()),
            },
        },
        Err(e) => log::warn!("Skipping {}: {e}", cli.input.display()),
    }

    let job = BatchJob {
        input: cli.input.clone(),
        output,
    };
    BatchReport::from_results(&[job], &[result])
}

fn run_batch(
    cli: &Cli,
    use_case: Arc<CropImageUseCase>,
) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let inputs = list_images(&cli.input)?;
    if inputs.is_empty() {
        return Err(format!("No supported images found in {}", cli.input.display()).into());
    }

    let executor = match cli.workers {
        Some(n) => ThreadedBatchExecutor::new(n),
        None => ThreadedBatchExecutor::default(),
    };
    log::info!(
        "Using {} workers and {} detectors",
        executor.workers(),
        cli.detectors
    );

    let output_dir = cli.output.clone().unwrap_or_default();
    let batch = BatchCropUseCase::new(use_case, Box::new(executor), cli.dry_run);
    let mut logger = StdoutPipelineLogger::default();
    let report = batch.execute(inputs, &output_dir, &mut logger)?;

    log::info!(
        "Done: {} cropped, {} planned, {} skipped, {} failed",
        report.cropped,
        report.planned,
        report.skipped,
        report.failed
    );
    Ok(report)
}

/// A single input written into an existing directory gets the batch name.
fn resolve_single_output(input: &Path, output: &Path) -> PathBuf {
    if output.is_dir() {
        output.join(output_file_name(input))
    } else {
        output.to_path_buf()
    }
}

fn build_policy(cli: &Cli) -> Result<CropPolicy, Box<dyn std::error::Error>> {
    let mut policy = CropPolicy::resolve(cli.policy.as_deref())?;
    apply_overrides(cli, &mut policy);
    policy.validate()?;
    Ok(policy)
}

fn apply_overrides(cli: &Cli, policy: &mut CropPolicy) {
    if let Some(v) = cli.confidence {
        policy.confidence_threshold = v;
    }
    if let Some(v) = cli.padding {
        policy.padding_ratio = v;
    }
    if let Some(v) = cli.tolerance {
        policy.border_tolerance = v;
    }
    if let Some(v) = cli.width {
        policy.output_width = v;
    }
    if let Some(v) = cli.height {
        policy.output_height = v;
    }
    if let Some(v) = cli.bleed {
        policy.bleed = v;
    }
    if let Some(v) = cli.selection {
        policy.selection = v;
    }
    if let Some(v) = cli.fallback {
        policy.fallback = v;
    }
}

fn build_detectors(
    cli: &Cli,
    policy: &CropPolicy,
) -> Result<DetectorPool, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let source = ModelSource {
        explicit: cli.model.clone(),
        url: cli.model_url.clone(),
        bundled_dir: bundled_model_dir(),
    };
    let model_path =
        model_resolver::resolve(YOLO_MODEL_NAME, &source, Some(Box::new(download_progress)))?;

    // Selection applies the real threshold; the detector only drops noise.
    let floor = DEFAULT_CONFIDENCE.min(policy.confidence_threshold);
    DetectorPool::build(cli.detectors, || {
        let detector: Box<dyn SubjectDetector> =
            Box::new(OnnxYoloDetector::new(&model_path, floor)?);
        Ok(detector)
    })
}

/// `models/` next to the executable, for pre-packaged installs.
fn bundled_model_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.input.is_file() && !is_image(&cli.input) {
        return Err(format!("Unsupported image type: {}", cli.input.display()).into());
    }
    if !cli.dry_run && cli.output.is_none() {
        return Err("Output path is required unless --dry-run is used".into());
    }
    if cli.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if cli.detectors == 0 {
        return Err("Detectors must be at least 1".into());
    }
    if let Some(c) = cli.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection model... {pct}%");
    } else {
        eprint!("\rDownloading detection model... {downloaded} bytes");
    }
}
