use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cropping::domain::focus_mode::FocusMode;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;

use super::crop_engine::{CropEngine, CropPlan};
use super::skipped::Skipped;

/// Wall-clock time spent in each stage for one image, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTimings {
    pub decode_ms: f64,
    pub crop_ms: f64,
    pub write_ms: f64,
}

/// Result of a successful run on one image.
#[derive(Clone, Debug, PartialEq)]
pub struct CropOutcome {
    pub plan: CropPlan,
    /// Where the output landed; `None` for a dry run.
    pub written: Option<PathBuf>,
    pub timings: StageTimings,
}

/// Single-image pipeline: read → crop → write.
///
/// Holds only shared, read-only collaborators, so one instance can be used
/// from many worker threads at once.
pub struct CropImageUseCase {
    reader: Arc<dyn ImageReader>,
    writer: Arc<dyn ImageWriter>,
    engine: Arc<CropEngine>,
    focus: FocusMode,
}

impl CropImageUseCase {
    pub fn new(
        reader: Arc<dyn ImageReader>,
        writer: Arc<dyn ImageWriter>,
        engine: Arc<CropEngine>,
        focus: FocusMode,
    ) -> Self {
        Self {
            reader,
            writer,
            engine,
            focus,
        }
    }

    /// Crops `input` and writes the result to `output`.
    ///
    /// With `output` of `None` only the plan is computed and nothing is
    /// written.
    pub fn execute(&self, input: &Path, output: Option<&Path>) -> Result<CropOutcome, Skipped> {
        let mut timings = StageTimings::default();

        let start = Instant::now();
        let frame = self
            .reader
            .read(input)
            .map_err(|e| Skipped::DecodeFailed {
                path: input.to_path_buf(),
                reason: e.to_string(),
            })?;
        timings.decode_ms = elapsed_ms(start);

        let start = Instant::now();
        let plan = self.engine.plan(&frame, self.focus)?;
        let Some(output) = output else {
            timings.crop_ms = elapsed_ms(start);
            return Ok(CropOutcome {
                plan,
                written: None,
                timings,
            });
        };
        let cropped = self.engine.render(&frame, &plan);
        timings.crop_ms = elapsed_ms(start);

        let start = Instant::now();
        self.writer
            .write(output, &cropped)
            .map_err(|e| Skipped::WriteFailed {
                path: output.to_path_buf(),
                reason: e.to_string(),
            })?;
        timings.write_ms = elapsed_ms(start);

        Ok(CropOutcome {
            plan,
            written: Some(output.to_path_buf()),
            timings,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
