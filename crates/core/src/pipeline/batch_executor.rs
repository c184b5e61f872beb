use std::path::PathBuf;
use std::sync::Arc;

use super::crop_image_use_case::{CropImageUseCase, CropOutcome};
use super::pipeline_logger::PipelineLogger;
use super::skipped::Skipped;

/// One image to process. `output` of `None` means plan only.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

pub type ItemResult = Result<CropOutcome, Skipped>;

/// Abstracts how a batch of independent images is scheduled.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations. Implementations must run every job even when
/// earlier ones fail, and return one result per job in input order. An `Err`
/// is reserved for scheduler breakdowns (e.g. a panicked worker), never for
/// per-image problems.
pub trait BatchExecutor: Send {
    fn execute(
        &self,
        jobs: Vec<BatchJob>,
        use_case: Arc<CropImageUseCase>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<ItemResult>, Box<dyn std::error::Error>>;
}
