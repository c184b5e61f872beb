use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::shared::constants::OUTPUT_EXTENSION;
use crate::shared::image_files::output_file_name;

use super::batch_executor::{BatchExecutor, BatchJob};
use super::batch_report::{BatchReport, ItemStatus};
use super::crop_image_use_case::CropImageUseCase;
use super::pipeline_logger::PipelineLogger;

/// Crops many images into one output directory.
///
/// Every input gets exactly one report entry; a failed image never stops
/// its siblings.
pub struct BatchCropUseCase {
    use_case: Arc<CropImageUseCase>,
    executor: Box<dyn BatchExecutor>,
    dry_run: bool,
}

impl BatchCropUseCase {
    pub fn new(
        use_case: Arc<CropImageUseCase>,
        executor: Box<dyn BatchExecutor>,
        dry_run: bool,
    ) -> Self {
        Self {
            use_case,
            executor,
            dry_run,
        }
    }

    pub fn execute(
        &self,
        inputs: Vec<PathBuf>,
        output_dir: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<BatchReport, Box<dyn std::error::Error>> {
        let jobs = plan_jobs(inputs, output_dir, self.dry_run);
        logger.info(&format!(
            "Cropping {} images into {}",
            jobs.len(),
            output_dir.display()
        ));

        let results = self
            .executor
            .execute(jobs.clone(), self.use_case.clone(), logger)?;
        let report = BatchReport::from_results(&jobs, &results);

        for item in &report.items {
            let input = item.input.display();
            match item.status {
                ItemStatus::Cropped => {
                    if let Some(out) = &item.output {
                        log::info!("{input} → {}", out.display());
                    }
                }
                ItemStatus::Planned => log::info!("{input}: crop box {:?}", item.crop_box),
                ItemStatus::Skipped | ItemStatus::Failed => log::warn!(
                    "Skipping {input}: {}",
                    item.reason.as_deref().unwrap_or("unknown reason")
                ),
            }
        }

        logger.summary();
        Ok(report)
    }
}

/// Pairs each input with its output path inside `output_dir`.
///
/// Inputs whose stems collide (`a.jpg`, `a.png`) keep distinct outputs by
/// folding the source extension into the later names, then a counter when
/// that is taken too (`a.PNG`, `a.png`).
pub fn plan_jobs(inputs: Vec<PathBuf>, output_dir: &Path, dry_run: bool) -> Vec<BatchJob> {
    let mut taken = HashSet::new();
    inputs
        .into_iter()
        .map(|input| {
            let mut name = output_file_name(&input);
            if taken.contains(&name) {
                name = unique_name(&input, &name, &taken);
                log::warn!(
                    "Output name collision for {}, writing {}",
                    input.display(),
                    name.display()
                );
            }
            taken.insert(name.clone());
            let output = (!dry_run).then(|| output_dir.join(&name));
            BatchJob { input, output }
        })
        .collect()
}

fn unique_name(input: &Path, name: &Path, taken: &HashSet<PathBuf>) -> PathBuf {
    let stem = name.with_extension("").to_string_lossy().into_owned();
    let base = match input.extension() {
        Some(ext) => format!("{stem}_{}", ext.to_string_lossy().to_lowercase()),
        None => stem,
    };
    let mut candidate = PathBuf::from(format!("{base}.{OUTPUT_EXTENSION}"));
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = PathBuf::from(format!("{base}_{n}.{OUTPUT_EXTENSION}"));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::cropping::domain::crop_policy::CropPolicy;
    use crate::cropping::domain::focus_mode::FocusMode;
    use crate::detection::domain::detection_candidate::DetectionCandidate;
    use crate::detection::domain::subject_detector::SubjectDetector;
    use crate::detection::infrastructure::detector_pool::DetectorPool;
    use crate::imaging::infrastructure::image_file_reader::ImageFileReader;
    use crate::imaging::infrastructure::image_file_writer::ImageFileWriter;
    use crate::pipeline::batch_executor::ItemResult;
    use crate::pipeline::crop_engine::CropEngine;
    use crate::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;

    // ── Stubs ──

    /// Reports a person covering the middle half of every frame.
    struct CenterPersonDetector;

    impl SubjectDetector for CenterPersonDetector {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<DetectionCandidate>, Box<dyn std::error::Error>> {
            let (w, h) = (frame.width() as i32, frame.height() as i32);
            let bbox = BoundingBox::new(w / 4, h / 4, 3 * w / 4, 3 * h / 4).ok_or("tiny frame")?;
            Ok(vec![DetectionCandidate::new(bbox, 0, 0.8)])
        }
    }

    /// Runs jobs one by one on the caller's thread.
    struct SequentialExecutor {
        seen: Arc<Mutex<Vec<BatchJob>>>,
    }

    impl BatchExecutor for SequentialExecutor {
        fn execute(
            &self,
            jobs: Vec<BatchJob>,
            use_case: Arc<CropImageUseCase>,
            _logger: &mut dyn PipelineLogger,
        ) -> Result<Vec<ItemResult>, Box<dyn std::error::Error>> {
            self.seen.lock().unwrap().extend(jobs.iter().cloned());
            Ok(jobs
                .iter()
                .map(|j| use_case.execute(&j.input, j.output.as_deref()))
                .collect())
        }
    }

    fn real_io_use_case() -> Arc<CropImageUseCase> {
        let pool = DetectorPool::new(vec![Box::new(CenterPersonDetector)]).unwrap();
        let policy = CropPolicy {
            output_width: 75,
            output_height: 90,
            ..CropPolicy::default()
        };
        Arc::new(CropImageUseCase::new(
            Arc::new(ImageFileReader::new()),
            Arc::new(ImageFileWriter::new()),
            Arc::new(CropEngine::new(Arc::new(pool), policy)),
            FocusMode::Full,
        ))
    }

    fn write_photo(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::from_pixel(80, 120, image::Rgb([250, 250, 250]));
        for y in 30..90 {
            for x in 20..60 {
                img.put_pixel(x, y, image::Rgb([90, 30, 20]));
            }
        }
        img.save(&path).unwrap();
        path
    }

    // ── plan_jobs ──

    #[test]
    fn test_plan_jobs_names_outputs() {
        let jobs = plan_jobs(
            vec![PathBuf::from("in/shirt.jpg"), PathBuf::from("in/dress.webp")],
            Path::new("out"),
            false,
        );
        assert_eq!(jobs[0].output, Some(PathBuf::from("out/trimmed_shirt.png")));
        assert_eq!(jobs[1].output, Some(PathBuf::from("out/trimmed_dress.png")));
    }

    #[test]
    fn test_plan_jobs_resolves_collisions() {
        let jobs = plan_jobs(
            vec![PathBuf::from("a.jpg"), PathBuf::from("a.PNG")],
            Path::new("out"),
            false,
        );
        assert_eq!(jobs[0].output, Some(PathBuf::from("out/trimmed_a.png")));
        assert_eq!(jobs[1].output, Some(PathBuf::from("out/trimmed_a_png.png")));
    }

    #[test]
    fn test_plan_jobs_same_extension_case_variants_stay_unique() {
        let jobs = plan_jobs(
            vec![
                PathBuf::from("a.PNG"),
                PathBuf::from("a.Png"),
                PathBuf::from("a.png"),
                PathBuf::from("a"),
            ],
            Path::new("out"),
            false,
        );
        let outputs: Vec<_> = jobs.iter().map(|j| j.output.clone().unwrap()).collect();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("out/trimmed_a.png"),
                PathBuf::from("out/trimmed_a_png.png"),
                PathBuf::from("out/trimmed_a_png_2.png"),
                PathBuf::from("out/trimmed_a_2.png"),
            ]
        );
        let unique: HashSet<_> = outputs.iter().collect();
        assert_eq!(unique.len(), outputs.len());
    }

    #[test]
    fn test_plan_jobs_dry_run_has_no_outputs() {
        let jobs = plan_jobs(vec![PathBuf::from("a.jpg")], Path::new("out"), true);
        assert!(jobs[0].output.is_none());
    }

    // ── execute ──

    #[test]
    fn test_batch_with_one_undecodable_image() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let mut inputs = Vec::new();
        for i in 1..=5 {
            let name = format!("{i}.png");
            if i == 3 {
                let path = dir.path().join(&name);
                std::fs::write(&path, b"not an image").unwrap();
                inputs.push(path);
            } else {
                inputs.push(write_photo(dir.path(), &name));
            }
        }

        let batch = BatchCropUseCase::new(
            real_io_use_case(),
            Box::new(ThreadedBatchExecutor::new(2)),
            false,
        );
        let report = batch
            .execute(inputs, &out_dir, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!((report.cropped, report.failed), (4, 1));
        assert_eq!(report.items[2].status, ItemStatus::Failed);
        for i in [1, 2, 4, 5] {
            let out = out_dir.join(format!("trimmed_{i}.png"));
            let img = image::open(&out).unwrap();
            assert_eq!((img.width(), img.height()), (75, 90));
        }
        assert!(!out_dir.join("trimmed_3.png").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let input = write_photo(dir.path(), "look.png");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let batch = BatchCropUseCase::new(
            real_io_use_case(),
            Box::new(SequentialExecutor { seen: seen.clone() }),
            true,
        );
        let report = batch
            .execute(vec![input], &out_dir, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(report.planned, 1);
        assert!(report.items[0].crop_box.is_some());
        assert!(!out_dir.exists());
        assert!(seen.lock().unwrap()[0].output.is_none());
    }
}
